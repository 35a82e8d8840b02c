pub mod session;
pub mod storage;
pub mod token;

pub use session::{SessionController, SessionEvent, SessionState};
pub use storage::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use token::{Credentials, Registration, TokenPair};
