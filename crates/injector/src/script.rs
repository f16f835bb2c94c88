//! Injector - creates and attaches script / noscript tags

use contracts::{
    ContractError, ElementId, LoadHandlers, Placement, ScriptDescriptor, SharedHost,
};
use tracing::{debug, instrument};

use crate::diagnostics::Diagnostics;

/// Script tag injector bound to one host
#[derive(Clone)]
pub struct Injector {
    host: SharedHost,
    diagnostics: Diagnostics,
}

impl Injector {
    /// Create a new Injector for the given host
    pub fn new(host: SharedHost, diagnostics: Diagnostics) -> Self {
        Self { host, diagnostics }
    }

    /// Underlying host
    pub fn host(&self) -> &SharedHost {
        &self.host
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    /// Resolve a placement to an existing node
    ///
    /// Fallback order: requested container, then the document body. A missing
    /// container never errors.
    pub fn resolve_container(&self, placement: Placement) -> ElementId {
        match placement {
            Placement::Body => self.host.body(),
            Placement::Head | Placement::Footer => self
                .host
                .container(placement)
                .unwrap_or_else(|| self.host.body()),
        }
    }

    /// Create a `<script>` tag from the descriptor and attach it
    ///
    /// Load failures always emit a warning naming the source before the
    /// caller's own `on_error` runs. Nothing is retried or deduplicated.
    ///
    /// # Errors
    /// - Empty source or attribute name
    /// - Host rejected an element operation
    #[instrument(
        name = "injector_inject",
        skip(self, descriptor),
        fields(src = %descriptor.src, target = %descriptor.target)
    )]
    pub fn inject(&self, descriptor: ScriptDescriptor) -> Result<ElementId, ContractError> {
        descriptor.validate()?;

        let ScriptDescriptor {
            src,
            async_load,
            defer,
            target,
            attributes,
            on_load,
            on_error,
        } = descriptor;

        let host = &self.host;
        let script = host.create_element("script");
        host.set_attribute(script, "src", &src)?;
        if async_load {
            host.set_attribute(script, "async", "")?;
        }
        if defer {
            host.set_attribute(script, "defer", "")?;
        }
        for (name, value) in &attributes {
            host.set_attribute(script, name, value)?;
        }

        let diagnostics = self.diagnostics;
        let failed_src = src.clone();
        host.set_load_handlers(
            script,
            LoadHandlers {
                on_load,
                on_error: Some(Box::new(move || {
                    diagnostics.warn(format!("Failed to load script: {failed_src}"));
                    observability::record_script_load_failure(&failed_src);
                    if let Some(callback) = on_error {
                        callback();
                    }
                })),
            },
        )?;

        let parent = self.resolve_container(target);
        host.append_child(parent, script)?;

        observability::record_script_injected(&target.to_string());
        debug!(element = %script, parent = %parent, "Script injected");
        Ok(script)
    }

    /// Create a `<noscript>` fallback with literal inner markup
    #[instrument(name = "injector_inject_noscript", skip(self, markup), fields(target = %placement))]
    pub fn inject_noscript(
        &self,
        markup: &str,
        placement: Placement,
    ) -> Result<ElementId, ContractError> {
        let noscript = self.create_noscript(markup)?;
        let parent = self.resolve_container(placement);
        self.host.append_child(parent, noscript)?;
        observability::record_noscript_injected(&placement.to_string());
        Ok(noscript)
    }

    /// Create a `<noscript>` fallback as the first child of the body
    #[instrument(name = "injector_inject_noscript_first", skip(self, markup))]
    pub fn inject_noscript_first(&self, markup: &str) -> Result<ElementId, ContractError> {
        let noscript = self.create_noscript(markup)?;
        self.host.prepend_child(self.host.body(), noscript)?;
        observability::record_noscript_injected("body");
        Ok(noscript)
    }

    fn create_noscript(&self, markup: &str) -> Result<ElementId, ContractError> {
        let noscript = self.host.create_element("noscript");
        self.host.set_inner_html(noscript, markup)?;
        Ok(noscript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::HostEnvironment;
    use page_sim::{LoadOutcome, PageOptions, SimulatedPage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn injector_for(page: &Arc<SimulatedPage>) -> Injector {
        let host: SharedHost = page.clone();
        Injector::new(host, Diagnostics::new(true))
    }

    #[test]
    fn test_inject_defaults_to_async_body() {
        let page = Arc::new(SimulatedPage::new());
        let injector = injector_for(&page);

        injector
            .inject(ScriptDescriptor::new("https://cdn.example.com/a.js"))
            .unwrap();

        let scripts = page.scripts();
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].container, "body");
        assert!(scripts[0].has_attribute("async"));
        assert!(!scripts[0].has_attribute("defer"));
    }

    #[test]
    fn test_inject_sets_flags_and_attributes() {
        let page = Arc::new(SimulatedPage::new());
        let injector = injector_for(&page);

        injector
            .inject(
                ScriptDescriptor::new("https://cdn.example.com/b.js")
                    .async_load(false)
                    .defer(true)
                    .target(Placement::Head)
                    .attribute("charset", "UTF-8"),
            )
            .unwrap();

        let script = &page.scripts()[0];
        assert_eq!(script.container, "head");
        assert!(!script.has_attribute("async"));
        assert!(script.has_attribute("defer"));
        assert_eq!(script.attribute("charset"), Some("UTF-8"));
    }

    #[test]
    fn test_missing_containers_fall_back_to_body() {
        let page = Arc::new(SimulatedPage::with_options(PageOptions {
            with_head: false,
            with_footer: false,
            ..PageOptions::default()
        }));
        let injector = injector_for(&page);

        injector
            .inject(ScriptDescriptor::new("/head.js").target(Placement::Head))
            .unwrap();
        injector
            .inject(ScriptDescriptor::new("/footer.js").target(Placement::Footer))
            .unwrap();
        injector
            .inject_noscript("<img src=\"/p.gif\">", Placement::Head)
            .unwrap();

        assert!(page.scripts().iter().all(|s| s.container == "body"));
        assert_eq!(page.noscripts()[0].0, "body");
    }

    #[test]
    fn test_footer_placement() {
        let page = Arc::new(SimulatedPage::new());
        let injector = injector_for(&page);
        injector
            .inject(ScriptDescriptor::new("/footer.js").target(Placement::Footer))
            .unwrap();
        assert_eq!(page.scripts()[0].container, "footer");
    }

    #[test]
    fn test_empty_source_rejected_without_touching_host() {
        let page = Arc::new(SimulatedPage::new());
        let injector = injector_for(&page);

        let err = injector.inject(ScriptDescriptor::new("")).unwrap_err();
        assert!(matches!(err, ContractError::InvalidDescriptor { .. }));
        assert!(page.scripts().is_empty());
    }

    #[test]
    fn test_no_dedup_of_identical_sources() {
        let page = Arc::new(SimulatedPage::new());
        let injector = injector_for(&page);
        injector.inject(ScriptDescriptor::new("/same.js")).unwrap();
        injector.inject(ScriptDescriptor::new("/same.js")).unwrap();
        assert_eq!(page.script_sources(), vec!["/same.js", "/same.js"]);
    }

    #[test]
    fn test_load_and_error_callbacks() {
        let page = Arc::new(SimulatedPage::with_options(PageOptions {
            fail_sources: vec!["broken".into()],
            ..PageOptions::default()
        }));
        let injector = injector_for(&page);
        let loaded = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));

        let l = Arc::clone(&loaded);
        injector
            .inject(ScriptDescriptor::new("/ok.js").on_load(move || {
                l.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        let f = Arc::clone(&failed);
        injector
            .inject(ScriptDescriptor::new("/broken.js").on_error(move || {
                f.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        injector
            .inject(ScriptDescriptor::new("/broken-no-callback.js"))
            .unwrap();

        let records = page.settle_loads();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].outcome, LoadOutcome::Loaded);
        assert_eq!(records[1].outcome, LoadOutcome::Failed);
        assert_eq!(records[2].outcome, LoadOutcome::Failed);
        assert_eq!(loaded.load(Ordering::SeqCst), 1);
        assert_eq!(failed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_noscript_first_is_prepended() {
        let page = Arc::new(SimulatedPage::new());
        let injector = injector_for(&page);
        let id = injector
            .inject_noscript_first("<iframe src=\"/ns.html\"></iframe>")
            .unwrap();

        assert_eq!(page.first_body_child_tag().as_deref(), Some("noscript"));
        assert!(page.body() != id);
        assert!(page.render_html().contains("<iframe src=\"/ns.html\"></iframe>"));
    }
}
