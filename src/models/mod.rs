pub mod catalog;
pub mod question;
pub mod user;

pub use question::{Entity as Question, Model as QuestionModel};
pub use user::{Entity as User, Model as UserModel};
