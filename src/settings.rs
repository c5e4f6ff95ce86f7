//! The read-only settings table method handlers consult
//!
//! Built once at startup and shared across all connections without locking;
//! no handler mutates it.

use serde::Serialize;

use crate::errors::AppError;

/// A typed setting value. The wire protocol reports values as strings and
/// types by name, so the enum carries the kind invariant by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl SettingValue {
    /// Type name as reported by `GetAllSettings`, matching what the host
    /// emits for each setting kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Str(_) => "str",
        }
    }

    /// String form as reported by `GetSetting` and `GetAllSettings`.
    pub fn render(&self) -> String {
        match self {
            Self::Bool(value) => value.to_string(),
            Self::Int(value) => value.to_string(),
            Self::Str(value) => value.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Setting {
    pub name: String,
    pub value: SettingValue,
}

/// One row of the `GetAllSettings` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingEntry {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: String,
}

/// Fixed mapping from setting name to typed value, in table-definition
/// order. Names are unique; entries are neither added nor removed after
/// construction.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    entries: Vec<Setting>,
}

impl SettingsStore {
    /// Builds a store from an explicit table so tests can supply distinct
    /// configurations. Callers must not pass duplicate names.
    pub fn new(entries: Vec<Setting>) -> Self {
        debug_assert!({
            let mut names: Vec<&str> = entries.iter().map(|entry| entry.name.as_str()).collect();
            names.sort_unstable();
            names.windows(2).all(|pair| pair[0] != pair[1])
        });
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Result<&Setting, AppError> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| AppError::unknown_setting(name))
    }

    /// Every setting in insertion order, rendered as `{key, type, value}`.
    pub fn list(&self) -> Vec<SettingEntry> {
        self.entries
            .iter()
            .map(|entry| SettingEntry {
                key: entry.name.clone(),
                kind: entry.value.type_name(),
                value: entry.value.render(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The default table the emulated host ships with. Most of these are
    /// torrent-engine tuning knobs the client daemon reads at startup; the
    /// values mirror the host's defaults.
    pub fn defaults() -> Self {
        use SettingValue::{Bool, Int};

        let string = |value: &str| SettingValue::Str(value.to_string());
        let table = vec![
            ("download_path", string("download/")),
            ("library_path", string("library/")),
            ("torrents_path", string("torrents/")),
            ("download_storage", Int(0)),
            ("skip_burst_search", Int(1)),
            ("auto_memory_size", Int(1)),
            ("auto_adjust_memory_size", Int(1)),
            ("auto_memory_size_strategy", Int(0)),
            ("memory_size", Int(0)),
            ("auto_kodi_buffer_size", Int(1)),
            ("auto_adjust_buffer_size", Int(1)),
            ("min_candidate_size", Int(0)),
            ("min_candidate_show_size", Int(0)),
            ("buffer_timeout", Int(5)),
            ("buffer_size", Int(10)),
            ("end_buffer_size", Int(10)),
            ("max_upload_rate", Int(0)),
            ("max_download_rate", Int(0)),
            ("autoload_torrents", Int(1)),
            ("autoload_torrents_paused", Bool(false)),
            ("spoof_user_agent", Bool(false)),
            ("limit_after_buffering", Bool(false)),
            ("download_file_strategy", Int(2)),
            ("keep_downloading", Int(1)),
            ("keep_files_playing", Int(1)),
            ("keep_files_finished", Int(1)),
            ("use_torrent_history", Int(1)),
            ("torrent_history_size", Int(10)),
            ("use_fanart_tv", Bool(false)),
            ("disable_bg_progress", Int(0)),
            ("disable_bg_progress_playback", Int(0)),
            ("force_use_trakt", Bool(false)),
            ("use_cache_selection", Int(1)),
            ("use_cache_search", Int(1)),
            ("use_cache_torrents", Int(1)),
            ("cache_search_duration", Int(10)),
            ("results_per_page", Int(10)),
            ("show_files_watched", Int(1)),
            ("greeting_enabled", Int(1)),
            ("enable_overlay_status", Int(1)),
            ("silent_stream_start", Bool(false)),
            ("autoyes_enabled", Bool(false)),
            ("autoyes_timeout", Int(5)),
            ("choose_stream_auto_movie", Bool(false)),
            ("choose_stream_auto_show", Bool(false)),
            ("choose_stream_auto_search", Bool(false)),
            ("force_link_type", Bool(false)),
            ("use_original_title", Int(1)),
            ("use_anime_en_title", Bool(false)),
            ("use_lowest_release_date", Bool(false)),
            ("add_specials", Bool(false)),
            ("add_episode_numbers", Bool(false)),
            ("unaired_seasons", Bool(false)),
            ("unaired_episodes", Bool(false)),
            ("show_episodes_on_release_day", Bool(false)),
            ("show_unwatched_episodes_number", Bool(false)),
            ("seasons_all", Bool(false)),
            ("seasons_order", Int(0)),
            ("seasons_specials", Bool(false)),
            ("playback_percent", Int(1)),
            ("smart_episode_start", Bool(false)),
            ("smart_episode_match", Bool(false)),
            ("smart_episode_choose", Bool(false)),
            ("library_enabled", Bool(false)),
            ("library_sync_enabled", Bool(false)),
            ("library_sync_playback_enabled", Bool(false)),
            ("library_update", Int(0)),
            ("strm_language", Bool(false)),
            ("library_nfo_movies", Bool(false)),
            ("library_nfo_shows", Bool(false)),
            ("seed_forever", Int(1)),
            ("share_ratio_limit", Int(0)),
            ("seed_time_ratio_limit", Int(0)),
            ("seed_time_limit", Int(0)),
            ("disable_upload", Bool(false)),
            ("disable_lsd", Bool(false)),
            ("disable_dht", Bool(false)),
            ("disable_tcp", Bool(false)),
            ("disable_utp", Bool(false)),
            ("disable_upnp", Bool(false)),
            ("encryption_policy", Int(0)),
            ("listen_port_min", Int(61000)),
            ("listen_port_max", Int(62000)),
            ("listen_interfaces", string("")),
            ("listen_autodetect_ip", Int(1)),
            ("listen_autodetect_port", Int(1)),
            ("outgoing_interfaces", string("")),
            ("tuned_storage", Bool(false)),
            ("disk_cache_size", Int(0)),
            ("use_libtorrent_config", Int(1)),
            ("use_libtorrent_logging", Int(1)),
            ("use_libtorrent_deadline", Bool(false)),
            ("use_libtorrent_pauseresume", Bool(false)),
            ("libtorrent_profile", Int(0)),
            ("magnet_resolve_timeout", Int(5)),
            ("add_extra_trackers", Int(1)),
            ("remove_original_trackers", Bool(false)),
            ("modify_trackers_strategy", Int(1)),
            ("connections_limit", Int(0)),
            ("conntracker_limit", Int(0)),
            ("conntracker_limit_auto", Int(0)),
            ("log_level", Int(5)),
        ];

        Self::new(
            table
                .into_iter()
                .map(|(name, value)| Setting {
                    name: name.to_string(),
                    value,
                })
                .collect(),
        )
    }
}
