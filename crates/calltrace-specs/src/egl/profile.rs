//! Which GL flavour the current EGL context speaks.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use super::{EGL_OPENGL_API, EGL_OPENGL_ES_API};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Profile {
    /// Desktop OpenGL (compatibility profile).
    Compat = 1,
    Es1 = 2,
    Es2 = 3,
}

impl Profile {
    /// Maps `EGL_CONTEXT_CLIENT_TYPE` / `EGL_CONTEXT_CLIENT_VERSION` to a profile.
    pub fn from_context(client_type: u32, client_version: i32) -> Option<Self> {
        match client_type {
            EGL_OPENGL_API => Some(Profile::Compat),
            EGL_OPENGL_ES_API if client_version <= 1 => Some(Profile::Es1),
            EGL_OPENGL_ES_API => Some(Profile::Es2),
            _ => None,
        }
    }

    fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Profile::Compat),
            2 => Some(Profile::Es1),
            3 => Some(Profile::Es2),
            _ => None,
        }
    }
}

/// Last profile made current through `eglMakeCurrent`. Shared between the EGL shims and
/// whatever consumes the profile (a GL layer, the trace header).
#[derive(Debug, Default)]
pub struct ProfileTracker {
    current: AtomicU8,
}

impl ProfileTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn current(&self) -> Option<Profile> {
        Profile::from_u8(self.current.load(Ordering::Acquire))
    }

    pub fn set(&self, profile: Profile) {
        self.current.store(profile as u8, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_version_selects_the_es_profile() {
        assert_eq!(Profile::from_context(EGL_OPENGL_ES_API, 1), Some(Profile::Es1));
        assert_eq!(Profile::from_context(EGL_OPENGL_ES_API, 3), Some(Profile::Es2));
        assert_eq!(Profile::from_context(EGL_OPENGL_API, 4), Some(Profile::Compat));
        assert_eq!(Profile::from_context(0x30A1, 1), None);
    }

    #[test]
    fn tracker_starts_empty() {
        let tracker = ProfileTracker::new();
        assert_eq!(tracker.current(), None);
        tracker.set(Profile::Es2);
        assert_eq!(tracker.current(), Some(Profile::Es2));
    }
}
