//! Vendor definition macros
//!
//! Most chat widgets are nothing more than "inject one script built from the
//! configured id". This macro generates the roster entry for them.

/// Define a roster entry that injects a single script derived from an id
///
/// The entry is enabled when the id is non-empty.
///
/// # Usage
/// ```ignore
/// define_script_vendor!(
///     /// Apex live chat
///     apex_chat,                 // Constructor name
///     "Apex Chat",               // Roster entry name
///     |id| format!("//www.apex.live/scripts/invitation.ashx?company={id}")
/// );
/// ```
macro_rules! define_script_vendor {
    (
        $(#[$meta:meta])*
        $fn_name:ident,
        $label:literal,
        |$id:ident| $src:expr
        $(, target = $placement:expr)?
    ) => {
        $(#[$meta])*
        pub fn $fn_name(id: &str, injector: &::injector::Injector) -> ::contracts::ActionEntry {
            let $id = id.to_string();
            let injector = injector.clone();
            ::contracts::ActionEntry::gated($label, !$id.is_empty(), move || {
                injector
                    .diagnostics()
                    .log(format!(concat!("Setting up ", $label, ": {}"), $id));
                let $id = $id.as_str();
                injector.inject(
                    ::contracts::ScriptDescriptor::new($src)
                        $(.target($placement))?,
                )?;
                Ok(())
            })
        }
    };
}
