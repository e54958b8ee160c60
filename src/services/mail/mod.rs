pub mod address;
pub mod body;
pub mod message;

pub use address::MailAddress;
pub use body::MailBody;
pub use message::Mail;
