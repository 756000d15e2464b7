pub mod chatmodel;
pub mod escrowmodel;
pub mod marketmodel;
pub mod usermodel;
