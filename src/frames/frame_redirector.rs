use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::debug;

use crate::dom::document::Document;
use crate::frames::target_resolver::{Destination, Resolution, TargetResolver};
use crate::observers::interception::{InterceptionDelegate, Intent};

/// A navigation that some hook took over, waiting for the navigator to act on it.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedNavigation {
    pub intent: Intent,
    pub destination: Destination,
    pub redirected: bool,
}

pub type RoutingQueue = Rc<RefCell<VecDeque<RoutedNavigation>>>;

/// Intercepts navigations that must run somewhere other than the element's
/// own scope: a named scope elsewhere on the page, or the page root.
pub struct FrameRedirector {
    document: Rc<Document>,
    resolver: TargetResolver,
    routes: RoutingQueue,
}

impl FrameRedirector {
    pub fn new(document: Rc<Document>, resolver: TargetResolver, routes: RoutingQueue) -> Self {
        Self {
            document,
            resolver,
            routes,
        }
    }

    pub fn resolve(&self, intent: &Intent) -> Resolution {
        self.resolver.resolve(&self.document, intent)
    }
}

impl InterceptionDelegate for FrameRedirector {
    fn should_intercept(&self, intent: &Intent) -> bool {
        self.resolve(intent).is_redirected()
    }

    fn intercepted(&self, intent: &Intent) {
        if let Resolution::Intercepted { destination, redirected } = self.resolve(intent) {
            debug!(destination = ?destination, "redirecting navigation");
            self.routes.borrow_mut().push_back(RoutedNavigation {
                intent: intent.clone(),
                destination,
                redirected,
            });
        }
    }
}
