//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 模拟页面 e2e 测试：配置 -> roster -> 分发器 -> 脚本加载
//! - 并发触发下的至多一次分发

#[cfg(test)]
mod contract_tests {
    use contracts::{ConfigVersion, TriggerKind, TriggerSource};

    #[test]
    fn test_config_version_serde() {
        let json = serde_json::to_string(&ConfigVersion::V1).unwrap();
        assert_eq!(json, "\"V1\"");
        let parsed: ConfigVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ConfigVersion::V1);
        assert!(serde_json::from_str::<ConfigVersion>("\"V2\"").is_err());
    }

    #[test]
    fn test_example_config_loads() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../config/loader.example.toml");
        let config = config_loader::ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(config.delay_timeout_ms, 5000);
        assert_eq!(config.triggers, TriggerKind::DEFAULT.to_vec());
        assert_eq!(config.analytics.google_analytics_id, "G-0000000000");
        assert_eq!(config.custom_scripts.len(), 1);
        assert!(!config.custom_scripts[0].enabled);
        assert_eq!(config.custom_scripts[0].init.as_deref(), Some("initReviews"));
    }

    #[test]
    fn test_trigger_source_labels() {
        assert_eq!(TriggerSource::Timer.to_string(), "timer");
        assert_eq!(
            TriggerSource::Interaction(TriggerKind::TouchStart).to_string(),
            "touchstart"
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        ActionEntry, ContractError, HostEnvironment, LoaderConfig, Roster, SharedHost, TriggerKind,
        TriggerSource,
    };
    use dispatcher::{DeferredDispatcher, DispatcherConfig, Phase};
    use page_sim::{LoadOutcome, PageOptions, SimulatedPage};

    const SITE_CONFIG: &str = r#"
        debug = true

        [analytics]
        google_analytics_id = "G-TEST123"
        google_tag_manager_id = "GTM-ABC"

        [chat]
        hubspot_id = "4242"
    "#;

    fn site_config() -> LoaderConfig {
        ConfigLoader::load_from_str(SITE_CONFIG, ConfigFormat::Toml).unwrap()
    }

    fn page() -> Arc<SimulatedPage> {
        Arc::new(SimulatedPage::new())
    }

    fn install(page: &Arc<SimulatedPage>, config: &LoaderConfig) -> DeferredDispatcher {
        let host: SharedHost = page.clone();
        let roster = vendors::build_roster(config, Arc::clone(&host));
        let dispatcher =
            DeferredDispatcher::new(host, DispatcherConfig::from_loader(config), roster).unwrap();
        dispatcher.install().unwrap();
        dispatcher
    }

    /// Roster of two counting entries: `enabled` is configured, `disabled` is not
    fn counting_roster(enabled: &Arc<AtomicUsize>, disabled: &Arc<AtomicUsize>) -> Roster {
        let e1 = Arc::clone(enabled);
        let e2 = Arc::clone(disabled);
        Roster::new()
            .with(ActionEntry::gated("enabled", true, move || {
                e1.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .with(ActionEntry::gated("disabled", false, move || {
                e2.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
    }

    /// No interaction: the fallback timer dispatches exactly once at the delay
    #[tokio::test(start_paused = true)]
    async fn test_e2e_fallback_dispatch() {
        let page = page();
        let e1 = Arc::new(AtomicUsize::new(0));
        let e2 = Arc::new(AtomicUsize::new(0));
        let host: SharedHost = page.clone();
        let dispatcher = DeferredDispatcher::new(
            host,
            DispatcherConfig::default(),
            counting_roster(&e1, &e2),
        )
        .unwrap();
        dispatcher.install().unwrap();
        page_sim::settle().await;

        assert_eq!(dispatcher.phase(), Phase::Armed);
        assert_eq!(page.listener_count(), 5);
        assert_eq!(page.pending_timer_count(), 1);

        page_sim::run_for(Duration::from_millis(4999)).await;
        assert!(!dispatcher.is_fired());

        page_sim::run_for(Duration::from_millis(1)).await;
        assert!(dispatcher.is_fired());
        assert_eq!(e1.load(Ordering::SeqCst), 1);
        assert_eq!(e2.load(Ordering::SeqCst), 0);
        assert_eq!(page.listener_count(), 0);
        assert_eq!(page.pending_timer_count(), 0);

        // Late events reach no listener
        assert_eq!(page.dispatch_event(TriggerKind::Scroll), 0);
        page_sim::run_for(Duration::from_secs(30)).await;
        assert_eq!(e1.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.report().unwrap().source, TriggerSource::Timer);
    }

    /// A scroll before the delay dispatches immediately; the timer never fires
    #[tokio::test(start_paused = true)]
    async fn test_e2e_interaction_preempts_timer() {
        let page = page();
        let config = site_config();
        let dispatcher = install(&page, &config);
        page_sim::settle().await;

        page_sim::run_for(Duration::from_millis(1200)).await;
        assert_eq!(page.dispatch_event(TriggerKind::Scroll), 1);
        assert!(dispatcher.is_fired());
        assert_eq!(page.pending_timer_count(), 0);

        let report = dispatcher.report().unwrap();
        assert_eq!(report.source, TriggerSource::Interaction(TriggerKind::Scroll));
        assert_eq!(
            report.ran,
            vec!["Google Analytics", "Google Tag Manager", "HubSpot Chat"]
        );
        assert_eq!(report.skipped.len(), 13);

        page_sim::run_for(Duration::from_secs(10)).await;
        assert_eq!(dispatcher.metrics().triggers_received, 1);
        assert_eq!(
            page.script_sources(),
            vec![
                "https://www.googletagmanager.com/gtm.js?id=GTM-ABC",
                "https://www.googletagmanager.com/gtag/js?id=G-TEST123",
                "https://js.hs-scripts.com/4242.js",
            ],
            "scripts are listed in document order, head first"
        );
        assert_eq!(page.scripts()[0].container, "head");
    }

    /// Scroll and click queued in the same turn produce a single pass
    #[tokio::test(start_paused = true)]
    async fn test_e2e_same_turn_events_absorbed() {
        let page = page();
        let config = site_config();
        let dispatcher = install(&page, &config);
        page_sim::settle().await;

        let delivered = page.dispatch_events(&[TriggerKind::Scroll, TriggerKind::Click]);
        assert_eq!(delivered, 2);

        let metrics = dispatcher.metrics();
        assert_eq!(metrics.triggers_received, 2);
        assert_eq!(metrics.triggers_absorbed, 1);
        assert_eq!(page.scripts().len(), 3);
        assert_eq!(
            dispatcher.report().unwrap().source,
            TriggerSource::Interaction(TriggerKind::Scroll)
        );
    }

    /// Loader installed while the document is still parsing
    #[tokio::test(start_paused = true)]
    async fn test_e2e_install_before_ready() {
        let page = Arc::new(SimulatedPage::with_options(PageOptions {
            loading: true,
            ..PageOptions::default()
        }));
        let config = site_config();
        let dispatcher = install(&page, &config);
        page_sim::settle().await;

        assert_eq!(dispatcher.phase(), Phase::Pending);
        assert_eq!(page.dispatch_event(TriggerKind::Click), 0);

        page_sim::run_for(Duration::from_secs(10)).await;
        assert!(!dispatcher.is_fired());

        page.finish_loading();
        page_sim::settle().await;
        assert_eq!(dispatcher.phase(), Phase::Armed);

        page_sim::run_for(Duration::from_millis(5000)).await;
        assert!(dispatcher.is_fired());
    }

    /// Without idle support the fallback timer is armed straight away
    #[tokio::test(start_paused = true)]
    async fn test_e2e_no_idle_support() {
        let page = Arc::new(SimulatedPage::with_options(PageOptions {
            idle_support: false,
            ..PageOptions::default()
        }));
        let config = site_config();
        let dispatcher = install(&page, &config);
        page_sim::settle().await;

        assert_eq!(page.pending_timer_count(), 1);
        page_sim::run_for(Duration::from_millis(5000)).await;
        assert!(dispatcher.is_fired());
    }

    /// Slow idle delays arming the timer, bounded by the idle timeout
    #[tokio::test(start_paused = true)]
    async fn test_e2e_idle_latency_bounded() {
        let page = Arc::new(SimulatedPage::with_options(PageOptions {
            idle_latency: Duration::from_secs(60),
            ..PageOptions::default()
        }));
        let config = site_config();
        let dispatcher = install(&page, &config);
        page_sim::settle().await;
        assert_eq!(page.pending_timer_count(), 0);

        page_sim::run_for(Duration::from_millis(1000)).await;
        assert_eq!(page.pending_timer_count(), 1);

        page_sim::run_for(Duration::from_millis(4999)).await;
        assert!(!dispatcher.is_fired());
        page_sim::run_for(Duration::from_millis(1)).await;
        assert!(dispatcher.is_fired());
    }

    /// Every vendor configured, one script failing to load
    #[tokio::test(start_paused = true)]
    async fn test_e2e_full_roster_with_failing_source() {
        let content = r#"
            [analytics]
            google_analytics_id = "G-1"
            google_tag_manager_id = "GTM-1"
            google_ads_id = "AW-1"
            call_metrics_id = "AW-1/abc"
            call_metrics_phones = ["1-555-000-0000"]
            lead_conversion_id = "AW-1/lead"
            facebook_pixel_id = "123456"
            bing_conversion_id = "998877"
            hotjar_id = "3344"

            [chat]
            ngage_id = "0-1"
            olark_id = "1-2-3"
            apex_id = "acme"
            intaker_id = "firm"
            juvo_leads_id = "55"
            hubspot_id = "66"

            [services]
            click_cease = true
            google_translate = true

            [provesource]
            api_key = "pk"

            [userway]
            enabled = true
            account = "uw"

            [accessibe]
            enabled = true

            [[custom_scripts]]
            name = "reviews"
            src = "https://reviews.example.com/widget.js"
            placement = "footer"
        "#;
        let config = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap();

        let page = Arc::new(SimulatedPage::with_options(PageOptions {
            fail_sources: vec!["js.hs-scripts.com".into()],
            ..PageOptions::default()
        }));
        let dispatcher = install(&page, &config);
        page_sim::settle().await;

        page.dispatch_event(TriggerKind::KeyDown);
        let report = dispatcher.report().unwrap();
        assert_eq!(report.ran.len(), 17);
        assert!(report.skipped.is_empty());
        assert!(!report.has_failures());
        assert_eq!(report.ran.last().map(String::as_str), Some("custom:reviews"));

        let loads = page.settle_loads();
        let failed: Vec<_> = loads
            .iter()
            .filter(|l| l.outcome == LoadOutcome::Failed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].src, "https://js.hs-scripts.com/66.js");
        assert_eq!(loads.len(), page.scripts().len());

        // GTM noscript sits first in body
        assert_eq!(page.first_body_child_tag().as_deref(), Some("noscript"));
        assert_eq!(
            page.global("acsbJS"),
            None,
            "accessiBe init requires the vendor script to define acsbJS"
        );
    }

    /// Faulting entries neither abort the pass nor re-open the dispatcher
    #[tokio::test(start_paused = true)]
    async fn test_e2e_faulting_entries_isolated() {
        let page = page();
        let after = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&after);
        let roster = Roster::new()
            .with(ActionEntry::gated("erroring", true, || {
                Err(ContractError::effect("erroring", "vendor unavailable"))
            }))
            .with(ActionEntry::gated("panicking", true, || panic!("boom")))
            .with(ActionEntry::gated("after", true, move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));

        let host: SharedHost = page.clone();
        let dispatcher =
            DeferredDispatcher::new(host, DispatcherConfig::default(), roster).unwrap();
        dispatcher.install().unwrap();
        page_sim::settle().await;

        page.dispatch_event(TriggerKind::MouseMove);
        assert_eq!(after.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.phase(), Phase::Fired);

        let report = dispatcher.report().unwrap();
        assert_eq!(report.ran, vec!["after"]);
        let failed: Vec<_> = report.failed.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(failed, vec!["erroring", "panicking"]);

        page.dispatch_event(TriggerKind::MouseMove);
        page_sim::run_for(Duration::from_secs(10)).await;
        assert_eq!(after.load(Ordering::SeqCst), 1);
    }

    /// Events delivered from many threads at once still yield one pass
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_e2e_concurrent_triggers() {
        let page = page();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let roster = Roster::new().with(ActionEntry::gated("once", true, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        let host: SharedHost = page.clone();
        let dispatcher =
            DeferredDispatcher::new(host, DispatcherConfig::default(), roster).unwrap();
        dispatcher.arm().unwrap();

        std::thread::scope(|scope| {
            for i in 0..8 {
                let page = Arc::clone(&page);
                scope.spawn(move || {
                    let kind = TriggerKind::DEFAULT[i % TriggerKind::DEFAULT.len()];
                    for _ in 0..50 {
                        page.dispatch_event(kind);
                    }
                });
            }
        });

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(dispatcher.is_fired());
        assert_eq!(page.listener_count(), 0);

        let metrics = dispatcher.metrics();
        assert_eq!(metrics.triggers_received, metrics.triggers_absorbed + 1);
    }

    /// Custom script init runs after its load settles, not during dispatch
    #[tokio::test(start_paused = true)]
    async fn test_e2e_custom_script_init() {
        let content = r#"
            [[custom_scripts]]
            name = "advancedTracking"
            src = "/extensions/advancedTracking.js"
            init = "initAdvancedTracking"
        "#;
        let config = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap();
        let page = page();
        let dispatcher = install(&page, &config);
        page_sim::settle().await;

        page.dispatch_event(TriggerKind::Click);
        assert_eq!(
            dispatcher.report().unwrap().ran,
            vec!["custom:advancedTracking"]
        );
        assert_eq!(page.global("initAdvancedTracking"), None);

        // The loaded script defines its init function
        page.set_global("initAdvancedTracking", serde_json::json!({}));
        page.settle_loads();
        assert_eq!(
            page.global("initAdvancedTracking").unwrap()["calls"],
            serde_json::json!([[]])
        );
        assert_eq!(
            page.global("delayedJsConfig").unwrap()["custom_scripts"][0]["init"],
            serde_json::json!("initAdvancedTracking")
        );
    }

    /// Tearing down before any trigger releases everything and runs nothing
    #[tokio::test(start_paused = true)]
    async fn test_e2e_teardown_before_dispatch() {
        let page = page();
        let config = site_config();
        let dispatcher = install(&page, &config);
        page_sim::settle().await;

        assert!(dispatcher.teardown());
        assert_eq!(page.listener_count(), 0);
        assert_eq!(page.pending_timer_count(), 0);

        page_sim::run_for(Duration::from_secs(10)).await;
        assert!(dispatcher.report().is_none());
        assert!(page.scripts().is_empty());
    }
}
