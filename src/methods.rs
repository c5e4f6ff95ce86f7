//! The fixed method surface of the emulated host application
//!
//! Each handler mirrors the shape and constants of the host API the client
//! daemon is written against; none of them carry state beyond the settings
//! store.

use serde_json::{json, Value};

use crate::errors::AppError;
use crate::rpc::dispatch::{Params, Registry};
use crate::settings::SettingsStore;

/// Virtual prefix the host resolves to a concrete filesystem location.
const VIRTUAL_PREFIX: &str = "special://";
const TRANSLATED_ROOT: &str = "/tmp";

pub fn build_registry() -> Registry {
    Registry::new()
        .with("GetAddonInfo", get_addon_info)
        .with("TranslatePath", translate_path)
        .with("GetPlatform", get_platform)
        .with("GetAllSettings", get_all_settings)
        .with("GetSetting", get_setting)
        .with("AddonSettings", addon_settings)
        .with("AddonSettingsOpened", addon_settings_opened)
        .with("GetLanguage", get_language)
}

/// Fixed identity record: addon id and the filesystem paths the host
/// would report for it.
fn get_addon_info(params: &Params<'_>, _store: &SettingsStore) -> Result<Value, AppError> {
    params.ensure_empty()?;
    Ok(json!({
        "id": "jay",
        "path": "/tmp",
        "home": "home",
        "Profile": "profile"
    }))
}

/// Rewrites a recognized `special://` prefix to the translated root;
/// anything else is passed through under the same root.
fn translate_path(params: &Params<'_>, _store: &SettingsStore) -> Result<Value, AppError> {
    let path = params.str_arg(0, "path")?;
    let suffix = path.strip_prefix(VIRTUAL_PREFIX).unwrap_or(path);
    Ok(Value::String(format!("{TRANSLATED_ROOT}/{suffix}")))
}

fn get_platform(params: &Params<'_>, _store: &SettingsStore) -> Result<Value, AppError> {
    params.ensure_empty()?;
    Ok(json!({
        "OS": "linux",
        "Arch": "x86_64"
    }))
}

fn get_all_settings(params: &Params<'_>, store: &SettingsStore) -> Result<Value, AppError> {
    params.ensure_empty()?;
    serde_json::to_value(store.list())
        .map_err(|err| AppError::internal(format!("settings list serialization: {err}")))
}

fn get_setting(params: &Params<'_>, store: &SettingsStore) -> Result<Value, AppError> {
    let name = params.str_arg(0, "id")?;
    let setting = store.get(name)?;
    Ok(Value::String(setting.value.render()))
}

/// Settings-open acknowledgement, first variant: the host answers with an
/// empty string.
fn addon_settings(params: &Params<'_>, _store: &SettingsStore) -> Result<Value, AppError> {
    params.str_arg(0, "addonID")?;
    Ok(Value::String(String::new()))
}

/// Settings-open acknowledgement, second variant: the host confirms the
/// dialog was opened.
fn addon_settings_opened(params: &Params<'_>, _store: &SettingsStore) -> Result<Value, AppError> {
    params.str_arg(0, "addonID")?;
    Ok(Value::Bool(true))
}

/// The host reports a fixed language tag regardless of the requested
/// format and region flags; both are still required and type-checked.
fn get_language(params: &Params<'_>, _store: &SettingsStore) -> Result<Value, AppError> {
    params.str_arg(0, "format")?;
    params.bool_arg(1, "withRegion")?;
    Ok(Value::String("English-UK".to_string()))
}
