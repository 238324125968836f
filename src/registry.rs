use std::fmt;
use std::sync::Arc;

use crate::config::{BrowserConfig, KeyResolver};
use crate::page::Page;

/// Unique identifier for an admin page.
///
/// # Example
///
/// ```rust
/// let id = PageId::new("appointments");
/// assert_eq!(id.to_string(), "appointments");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageId(String);

impl PageId {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn key(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trait for admin page providers.
///
/// Implement this trait to register a page with the registry. The registry
/// uses it to list the page in the selector and to build a fresh page
/// instance every time the user opens it.
pub trait PageProvider: Send + Sync {
    /// Unique page key (e.g., "appointments", "lab-tests").
    fn key(&self) -> &'static str;

    /// Human-readable display name (e.g., "Appointments").
    fn display_name(&self) -> &'static str;

    /// Short description of what the page manages.
    fn description(&self) -> &'static str {
        ""
    }

    /// Icon or emoji for the page (optional).
    fn icon(&self) -> Option<&'static str> {
        None
    }

    fn page_id(&self) -> PageId {
        PageId::new(self.key())
    }

    /// Create a new page instance.
    fn create_page(&self, resolver: Arc<KeyResolver>, config: &BrowserConfig) -> Box<dyn Page>;
}

/// Registry of available admin pages, in registration order.
///
/// # Example
///
/// ```rust
/// let mut registry = PageRegistry::new();
/// registry.register(AppointmentsProvider::new(latency));
///
/// for page in registry.providers() {
///     println!("{}: {}", page.display_name(), page.description());
/// }
/// ```
pub struct PageRegistry {
    providers: Vec<Arc<dyn PageProvider>>,
}

impl PageRegistry {
    /// Create a new empty registry.
    pub const fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Register a page provider.
    ///
    /// If a provider with the same key already exists, it is replaced in place.
    pub fn register<P: PageProvider + 'static>(&mut self, provider: P) {
        let provider: Arc<dyn PageProvider> = Arc::new(provider);
        match self.providers.iter_mut().find(|p| p.key() == provider.key()) {
            Some(existing) => *existing = provider,
            None => self.providers.push(provider),
        }
    }

    /// Get a page provider by ID.
    pub fn get(&self, id: &PageId) -> Option<Arc<dyn PageProvider>> {
        self.providers.iter().find(|p| p.key() == id.key()).cloned()
    }

    /// All registered providers, in registration order.
    pub fn providers(&self) -> &[Arc<dyn PageProvider>] {
        &self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for PageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyEvent;
    use ratatui::Frame;
    use ratatui::layout::Rect;

    use super::*;
    use crate::Theme;
    use crate::page::PageMsg;
    use crate::ui::EventResult;

    struct MockProvider {
        key: &'static str,
        name: &'static str,
    }

    impl PageProvider for MockProvider {
        fn key(&self) -> &'static str {
            self.key
        }

        fn display_name(&self) -> &'static str {
            self.name
        }

        fn create_page(&self, _resolver: Arc<KeyResolver>, _config: &BrowserConfig) -> Box<dyn Page> {
            Box::new(MockPage)
        }
    }

    struct MockPage;

    impl Page for MockPage {
        fn handle_key(&mut self, _key: KeyEvent) -> EventResult<()> {
            EventResult::Ignored
        }

        fn update(&mut self) -> color_eyre::Result<PageMsg> {
            Ok(PageMsg::Idle)
        }

        fn render(&mut self, _frame: &mut Frame, _area: Rect, _theme: &Theme) {}

        fn breadcrumbs(&self) -> Vec<String> {
            vec!["Mock".to_string()]
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = PageRegistry::new();
        registry.register(MockProvider {
            key: "mock",
            name: "Mock",
        });

        assert!(registry.get(&PageId::new("mock")).is_some());
        assert!(registry.get(&PageId::new("missing")).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registration_order_is_kept_and_duplicates_replace() {
        let mut registry = PageRegistry::new();
        registry.register(MockProvider { key: "b", name: "B" });
        registry.register(MockProvider { key: "a", name: "A" });
        registry.register(MockProvider {
            key: "b",
            name: "B2",
        });

        let names: Vec<&str> = registry.providers().iter().map(|p| p.display_name()).collect();
        assert_eq!(names, vec!["B2", "A"]);
    }
}
