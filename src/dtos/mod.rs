pub mod apidtos;
pub mod bookingdtos;
pub mod servicedtos;
pub mod userdtos;
