//! Parse context threaded through a scan.

/// Scope state for one scan of command output.
///
/// Tracks the entity currently being described (a neighbor address, an
/// interface name), the sub-scope opened inside it (an address family, a
/// transceiver lane) and scope-local accumulators `L`. Locals are reset
/// whenever the entity or sub-scope changes.
#[derive(Debug, Clone)]
pub struct ParseContext<S, L = ()> {
    entity: Option<String>,
    sub_scope: Option<S>,
    locals: L,
}

impl<S, L: Default> Default for ParseContext<S, L> {
    fn default() -> Self {
        Self {
            entity: None,
            sub_scope: None,
            locals: L::default(),
        }
    }
}

impl<S, L: Default> ParseContext<S, L> {
    /// Create an empty context with no open entity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the entity scope for `key`.
    ///
    /// Returns `false` (and leaves every scope untouched) when `key` is
    /// already the open entity.
    pub fn open_entity(&mut self, key: &str) -> bool {
        if self.entity.as_deref() == Some(key) {
            return false;
        }
        self.entity = Some(key.to_string());
        self.close_sub_scopes();
        true
    }

    /// Close the entity and everything inside it.
    pub fn close_entity(&mut self) {
        self.entity = None;
        self.close_sub_scopes();
    }

    /// Close all sub-scopes of the current entity.
    pub fn close_sub_scopes(&mut self) {
        self.sub_scope = None;
        self.locals = L::default();
    }

    /// Enter a sub-scope of the current entity, replacing any open one.
    pub fn enter_sub_scope(&mut self, scope: S) {
        self.sub_scope = Some(scope);
        self.locals = L::default();
    }

    /// Key of the open entity.
    pub fn current_entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    /// The open sub-scope.
    pub fn current_sub_scope(&self) -> Option<&S> {
        self.sub_scope.as_ref()
    }

    /// Scope-local accumulators.
    pub fn locals(&self) -> &L {
        &self.locals
    }

    /// Mutable scope-local accumulators.
    pub fn locals_mut(&mut self) -> &mut L {
        &mut self.locals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Locals {
        list: Option<String>,
    }

    #[test]
    fn test_open_entity_is_idempotent() {
        let mut ctx: ParseContext<&str, Locals> = ParseContext::new();
        assert!(ctx.open_entity("10.0.0.1"));
        ctx.enter_sub_scope("IPv4 Unicast");
        assert!(!ctx.open_entity("10.0.0.1"));
        assert_eq!(ctx.current_sub_scope(), Some(&"IPv4 Unicast"));
    }

    #[test]
    fn test_new_entity_closes_sub_scopes() {
        let mut ctx: ParseContext<&str, Locals> = ParseContext::new();
        ctx.open_entity("10.0.0.1");
        ctx.enter_sub_scope("IPv4 Unicast");
        ctx.locals_mut().list = Some("pl".into());

        assert!(ctx.open_entity("10.0.0.2"));
        assert_eq!(ctx.current_entity(), Some("10.0.0.2"));
        assert!(ctx.current_sub_scope().is_none());
        assert_eq!(ctx.locals(), &Locals::default());
    }

    #[test]
    fn test_enter_sub_scope_resets_locals() {
        let mut ctx: ParseContext<u32, Locals> = ParseContext::new();
        ctx.open_entity("xe1");
        ctx.locals_mut().list = Some("x".into());
        ctx.enter_sub_scope(1);
        assert!(ctx.locals().list.is_none());
    }

    #[test]
    fn test_close_entity() {
        let mut ctx: ParseContext<u32> = ParseContext::new();
        ctx.open_entity("xe1");
        ctx.enter_sub_scope(0);
        ctx.close_entity();
        assert!(ctx.current_entity().is_none());
        assert!(ctx.current_sub_scope().is_none());
    }
}
