pub mod employee;
pub mod firearm;
pub mod maintenance_list;
