//! Scripts declared in the `custom_scripts` table

use std::sync::Arc;

use serde_json::json;

use contracts::{ActionEntry, CustomScript, HostEnvironment, ScriptDescriptor};
use injector::globals::push_nested;
use injector::{Diagnostics, Injector};

/// Roster name for a configured script
pub fn entry_name(script: &CustomScript) -> String {
    format!("custom:{}", script.name)
}

/// Build the descriptor for one configured script
pub fn descriptor(script: &CustomScript) -> ScriptDescriptor {
    script.attributes.iter().fold(
        ScriptDescriptor::new(&script.src)
            .async_load(script.async_load)
            .defer(script.defer)
            .target(script.placement),
        |descriptor, (name, value)| descriptor.attribute(name, value),
    )
}

/// One entry per configured script, in declared order
pub fn custom_scripts(scripts: &[CustomScript], injector: &Injector) -> Vec<ActionEntry> {
    scripts
        .iter()
        .map(|script| {
            let script = script.clone();
            let injector = injector.clone();
            ActionEntry::gated(entry_name(&script), script.enabled, move || {
                injector
                    .diagnostics()
                    .log(format!("Setting up {}: {}", script.name, script.src));
                let mut tag = descriptor(&script);
                if let Some(init) = &script.init {
                    let host = Arc::clone(injector.host());
                    let diagnostics = injector.diagnostics();
                    let (name, init) = (script.name.clone(), init.clone());
                    tag = tag.on_load(move || {
                        call_init(host.as_ref(), &diagnostics, &name, &init)
                    });
                }
                injector.inject(tag)?;
                if let Some(markup) = &script.noscript {
                    injector.inject_noscript(markup, script.placement)?;
                }
                Ok(())
            })
        })
        .collect()
}

/// Call the script's init function if loading it defined one
///
/// Page functions are modelled as object globals; a call is recorded as an
/// argument list appended to `calls`.
fn call_init(host: &dyn HostEnvironment, diagnostics: &Diagnostics, name: &str, init: &str) {
    if host.global(init).is_some_and(|f| f.is_object()) {
        diagnostics.log(format!("Initializing {name}"));
        push_nested(host, init, &["calls"], json!([]));
    } else {
        diagnostics.warn(format!("{name} loaded but init function not found: {init}"));
    }
}
