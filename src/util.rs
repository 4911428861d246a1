pub mod object;
pub mod url;
