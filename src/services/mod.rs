pub mod checkpoint;
pub mod connection;
pub mod mail;

pub use checkpoint::MailCheckPoint;
pub use connection::{MailServerConnection, SessionConnection};
pub use mail::{Mail, MailAddress, MailBody};
