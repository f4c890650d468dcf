//! Session context
//!
//! One logical actor per process: the session holds the id of the user every
//! flow acts as, plus the persisted flag pairs an external initializer reads
//! at startup (`isLoggedIn`, `stayLoggedIn`, both "true"/absent). The session
//! never holds a user record; reads go through the user repository.

use crate::infrastructure::store::SEED_USER_ID;
use di::{inject, injectable};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

pub const LOGGED_IN_KEY: &str = "isLoggedIn";
pub const STAY_LOGGED_IN_KEY: &str = "stayLoggedIn";

pub struct Session {
    current_user: RwLock<Option<Uuid>>,
    flags: RwLock<HashMap<String, String>>,
}

#[injectable]
impl Session {
    #[inject]
    pub fn create() -> Session {
        Session {
            current_user: RwLock::new(Some(SEED_USER_ID)),
            flags: RwLock::new(HashMap::new()),
        }
    }
}

impl Session {
    /// Session with no current user and no flags, for test setups.
    pub fn anonymous() -> Session {
        Session {
            current_user: RwLock::new(None),
            flags: RwLock::new(HashMap::new()),
        }
    }

    pub fn current_user(&self) -> Option<Uuid> {
        *self.current_user.read().expect("session lock poisoned")
    }

    pub fn set_current_user(&self, id: Uuid) {
        *self.current_user.write().expect("session lock poisoned") = Some(id);
    }

    pub fn is_logged_in(&self) -> bool {
        self.flag(LOGGED_IN_KEY).as_deref() == Some("true")
    }

    pub fn set_logged_in(&self, value: bool) {
        self.set_flag(LOGGED_IN_KEY, value);
    }

    pub fn stay_logged_in(&self) -> bool {
        self.flag(STAY_LOGGED_IN_KEY).as_deref() == Some("true")
    }

    pub fn set_stay_logged_in(&self, value: bool) {
        self.set_flag(STAY_LOGGED_IN_KEY, value);
    }

    pub fn flag(&self, key: &str) -> Option<String> {
        self.flags
            .read()
            .expect("session lock poisoned")
            .get(key)
            .cloned()
    }

    // "true" is stored, everything else means the key is absent.
    fn set_flag(&self, key: &str, value: bool) {
        let mut flags = self.flags.write().expect("session lock poisoned");
        if value {
            flags.insert(key.to_owned(), "true".to_owned());
        } else {
            flags.remove(key);
        }
    }
}
