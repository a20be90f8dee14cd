//! Authentication and session core: who is signed in, whether that is still
//! true, and whether they may see a given view.
//! Keep the public surface thin and split implementation across sub-modules.

mod role;
mod user;
mod session;
mod password;
mod authenticator;
mod validator;
mod guard;
pub mod clock;
pub mod storage;
pub mod store;

pub use role::{Role, UnknownRole};
pub use user::{normalize_email, User, UserRecord};
pub use session::{Invalidity, Session, SessionPolicy};
pub use password::{hash_password, verify_password};
pub use authenticator::{Authenticator, DefaultAdmin, MIN_PASSWORD_LEN};
pub use validator::SessionValidator;
pub use guard::{ActivityRefresher, GuardDecision, GuardState, GuardedMount, RouteGuard};
pub use clock::{Clock, ManualClock, SystemClock};
pub use storage::{ClientStorage, FileStorage, MemoryStorage, StorageError};
pub use store::{SessionStore, SESSION_KEY};
