//! Named views and guarded navigation.
//!
//! Protected views redirect to `Login` while signed out. Signed-in users
//! asking for `Login` or `Register` land on the dashboard instead.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Back-navigation entries kept; older ones are forgotten.
pub const BACK_STACK_LIMIT: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Login,
    Register,
    Dashboard,
    BookAppointment,
    MyAppointments,
    VirtualQueue,
    MedicalHistory,
    Hospitals,
    Profile,
}

impl View {
    pub fn all() -> &'static [View] {
        &[
            View::Login,
            View::Register,
            View::Dashboard,
            View::BookAppointment,
            View::MyAppointments,
            View::VirtualQueue,
            View::MedicalHistory,
            View::Hospitals,
            View::Profile,
        ]
    }

    pub fn path(&self) -> &'static str {
        match self {
            View::Login => "/login",
            View::Register => "/registro",
            View::Dashboard => "/dashboard",
            View::BookAppointment => "/solicitar-cita",
            View::MyAppointments => "/mis-citas",
            View::VirtualQueue => "/cola-virtual",
            View::MedicalHistory => "/historial",
            View::Hospitals => "/hospitales",
            View::Profile => "/perfil",
        }
    }

    /// Exact match, ignoring one trailing slash.
    pub fn from_path(path: &str) -> Option<View> {
        let path = match path.strip_suffix('/') {
            Some(stripped) if !stripped.is_empty() => stripped,
            _ => path,
        };
        Self::all().iter().copied().find(|v| v.path() == path)
    }

    /// Translation key of the navigation label.
    pub fn label_key(&self) -> &'static str {
        match self {
            View::Login => "auth.login",
            View::Register => "auth.register",
            View::Dashboard => "nav.dashboard",
            View::BookAppointment => "nav.book",
            View::MyAppointments => "nav.appointments",
            View::VirtualQueue => "nav.queue",
            View::MedicalHistory => "nav.history",
            View::Hospitals => "nav.hospitals",
            View::Profile => "nav.profile",
        }
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, View::Login | View::Register)
    }
}

/// Where a request for `target` ends up.
pub fn resolve(target: View, signed_in: bool) -> View {
    match (signed_in, target.requires_auth()) {
        (false, true) => View::Login,
        (true, false) => View::Dashboard,
        _ => target,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Navigator {
    current: View,
    back_stack: VecDeque<View>,
}

impl Navigator {
    pub fn new(signed_in: bool) -> Self {
        Self {
            current: resolve(View::Dashboard, signed_in),
            back_stack: VecDeque::new(),
        }
    }

    pub fn current(&self) -> View {
        self.current
    }

    /// Go to `target` (after the auth guard). Returns the view shown.
    pub fn navigate(&mut self, target: View, signed_in: bool) -> View {
        let resolved = resolve(target, signed_in);
        if resolved != target {
            tracing::debug!(requested = ?target, resolved = ?resolved, "Navigation redirected");
        }
        if resolved != self.current {
            if self.back_stack.len() == BACK_STACK_LIMIT {
                self.back_stack.pop_front();
            }
            self.back_stack.push_back(self.current);
            self.current = resolved;
        }
        resolved
    }

    /// Unknown paths go to the landing view.
    pub fn navigate_path(&mut self, path: &str, signed_in: bool) -> View {
        let target = View::from_path(path).unwrap_or(View::Dashboard);
        self.navigate(target, signed_in)
    }

    /// Previous view, skipping entries the guard would now reject.
    pub fn back(&mut self, signed_in: bool) -> View {
        while let Some(previous) = self.back_stack.pop_back() {
            if resolve(previous, signed_in) == previous {
                self.current = previous;
                return previous;
            }
        }
        self.current
    }

    /// Clear history and return to the landing view for the new auth state.
    pub fn reset(&mut self, signed_in: bool) -> View {
        self.back_stack.clear();
        self.current = resolve(View::Dashboard, signed_in);
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_out_is_sent_to_login() {
        let mut nav = Navigator::new(false);
        assert_eq!(nav.current(), View::Login);
        assert_eq!(nav.navigate(View::MedicalHistory, false), View::Login);
        assert_eq!(nav.navigate(View::Register, false), View::Register);
    }

    #[test]
    fn signed_in_skips_auth_screens() {
        let mut nav = Navigator::new(true);
        assert_eq!(nav.current(), View::Dashboard);
        assert_eq!(nav.navigate(View::Login, true), View::Dashboard);
        assert_eq!(nav.navigate(View::VirtualQueue, true), View::VirtualQueue);
    }

    #[test]
    fn paths_round_trip() {
        for view in View::all() {
            assert_eq!(View::from_path(view.path()), Some(*view));
        }
        assert_eq!(View::from_path("/mis-citas/"), Some(View::MyAppointments));
        assert_eq!(View::from_path("/nope"), None);
        let mut nav = Navigator::new(true);
        assert_eq!(nav.navigate_path("/nope", true), View::Dashboard);
    }

    #[test]
    fn back_skips_views_now_forbidden() {
        let mut nav = Navigator::new(false);
        nav.navigate(View::Register, false);
        nav.navigate(View::Dashboard, true);
        nav.navigate(View::Profile, true);
        assert_eq!(nav.back(true), View::Dashboard);
        // Register and Login are not reachable while signed in
        assert_eq!(nav.back(true), View::Dashboard);
    }

    #[test]
    fn reset_after_logout() {
        let mut nav = Navigator::new(true);
        nav.navigate(View::Hospitals, true);
        assert_eq!(nav.reset(false), View::Login);
        assert_eq!(nav.back(false), View::Login);
    }

    #[test]
    fn back_stack_is_bounded() {
        let mut nav = Navigator::new(true);
        for _ in 0..100 {
            nav.navigate(View::Hospitals, true);
            nav.navigate(View::Profile, true);
        }
        assert_eq!(nav.back_stack.len(), BACK_STACK_LIMIT);

        let mut steps = 0;
        while !nav.back_stack.is_empty() {
            nav.back(true);
            steps += 1;
        }
        assert_eq!(steps, BACK_STACK_LIMIT);
        // The oldest entry (the initial dashboard) was dropped
        assert_ne!(nav.current(), View::Dashboard);
    }
}
