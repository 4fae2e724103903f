pub mod chatmodels;
pub mod jobmodel;
pub mod usermodel;
