//! 配置校验模块
//!
//! 校验规则：
//! - 字段范围 (delay_timeout_ms, idle_timeout_ms, 货币代码) 由 `validator` derive 检查
//! - trigger 事件不重复
//! - custom_scripts 名称唯一
//! - 同一配置中的 vendor id 不含空白字符

use std::collections::HashSet;

use contracts::{ContractError, LoaderConfig};
use validator::Validate;

/// 校验 LoaderConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &LoaderConfig) -> Result<(), ContractError> {
    validate_fields(config)?;
    validate_triggers(config)?;
    validate_custom_scripts(config)?;
    validate_vendor_ids(config)?;
    Ok(())
}

/// derive 规则
fn validate_fields(config: &LoaderConfig) -> Result<(), ContractError> {
    config
        .validate()
        .map_err(|e| ContractError::config_validation("config", e.to_string()))
}

/// 校验 trigger 唯一性
fn validate_triggers(config: &LoaderConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, kind) in config.triggers.iter().enumerate() {
        if !seen.insert(kind) {
            return Err(ContractError::config_validation(
                format!("triggers[{idx}]"),
                format!("duplicate trigger '{kind}'"),
            ));
        }
    }
    Ok(())
}

/// 校验 custom_scripts 名称唯一
fn validate_custom_scripts(config: &LoaderConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, script) in config.custom_scripts.iter().enumerate() {
        if !seen.insert(script.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("custom_scripts[{idx}].name"),
                format!("duplicate custom script name '{}'", script.name),
            ));
        }
        if let Some(attr) = script.attributes.keys().find(|k| k.trim().is_empty()) {
            return Err(ContractError::config_validation(
                format!("custom_scripts[{idx}].attributes"),
                format!("attribute name cannot be empty: {attr:?}"),
            ));
        }
    }
    Ok(())
}

/// vendor id 会被拼进 URL，不允许空白
fn validate_vendor_ids(config: &LoaderConfig) -> Result<(), ContractError> {
    let ids = [
        ("analytics.google_analytics_id", &config.analytics.google_analytics_id),
        ("analytics.google_tag_manager_id", &config.analytics.google_tag_manager_id),
        ("analytics.google_ads_id", &config.analytics.google_ads_id),
        ("analytics.call_metrics_id", &config.analytics.call_metrics_id),
        ("analytics.lead_conversion_id", &config.analytics.lead_conversion_id),
        ("analytics.facebook_pixel_id", &config.analytics.facebook_pixel_id),
        ("analytics.bing_conversion_id", &config.analytics.bing_conversion_id),
        ("analytics.hotjar_id", &config.analytics.hotjar_id),
        ("chat.ngage_id", &config.chat.ngage_id),
        ("chat.olark_id", &config.chat.olark_id),
        ("chat.apex_id", &config.chat.apex_id),
        ("chat.intaker_id", &config.chat.intaker_id),
        ("chat.juvo_leads_id", &config.chat.juvo_leads_id),
        ("chat.hubspot_id", &config.chat.hubspot_id),
        ("provesource.api_key", &config.provesource.api_key),
        ("userway.account", &config.userway.account),
    ];

    for (field, value) in ids {
        if value.chars().any(char::is_whitespace) {
            return Err(ContractError::config_validation(
                field,
                format!("id must not contain whitespace, got {value:?}"),
            ));
        }
    }
    Ok(())
}
