use tokio::sync::mpsc;

/// Host notification permission, mirroring the usual tri-state plus the
/// unasked default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Permission {
    Default,
    Granted,
    Denied,
}

/// A single reminder on its way to the user.
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// Boundary to whatever actually shows reminders. Delivery is
/// fire-and-forget: `notify` has no failure channel and the scanner
/// never learns whether anything was shown.
pub trait Notifier: Send + Sync {
    fn permission(&self) -> Permission;

    /// Ask the host for permission and report the outcome. Only called
    /// while `permission()` is `Default`; the caller proceeds either way.
    fn request_permission(&self) -> Permission;

    fn notify(&self, notification: Notification);
}

/// Delivers reminders into the TUI event loop as toast popups. The
/// permission handed in at startup comes from config; requesting simply
/// grants, since showing a toast needs nothing from the host.
pub struct ToastNotifier {
    tx: mpsc::UnboundedSender<Notification>,
    permission: std::sync::Mutex<Permission>,
}

impl ToastNotifier {
    pub fn new(permission: Permission) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            ToastNotifier {
                tx,
                permission: std::sync::Mutex::new(permission),
            },
            rx,
        )
    }
}

impl Notifier for ToastNotifier {
    fn permission(&self) -> Permission {
        *self.permission.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn request_permission(&self) -> Permission {
        let mut permission = self.permission.lock().unwrap_or_else(|e| e.into_inner());
        if *permission == Permission::Default {
            *permission = Permission::Granted;
        }
        *permission
    }

    fn notify(&self, notification: Notification) {
        // Receiver gone means the UI is tearing down; nothing to do.
        let _ = self.tx.send(notification);
    }
}

/// Swallows everything. Used when notifications are switched off.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn permission(&self) -> Permission {
        Permission::Denied
    }

    fn request_permission(&self) -> Permission {
        Permission::Denied
    }

    fn notify(&self, _notification: Notification) {}
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every emitted notification for assertions.
    pub struct RecordingNotifier {
        pub permission: Permission,
        pub sent: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        pub fn granted() -> Self {
            RecordingNotifier {
                permission: Permission::Granted,
                sent: Mutex::new(Vec::new()),
            }
        }

        pub fn denied() -> Self {
            RecordingNotifier {
                permission: Permission::Denied,
                sent: Mutex::new(Vec::new()),
            }
        }

        pub fn titles(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|n| n.title.clone())
                .collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn permission(&self) -> Permission {
            self.permission
        }

        fn request_permission(&self) -> Permission {
            self.permission
        }

        fn notify(&self, notification: Notification) {
            self.sent.lock().unwrap().push(notification);
        }
    }
}
