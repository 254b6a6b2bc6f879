pub mod franchisedtos;
pub mod investmentdtos;
pub mod propertydtos;
