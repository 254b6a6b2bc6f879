pub mod franchisemodel;
pub mod investmentmodel;
pub mod propertymodel;
