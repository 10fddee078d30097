// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Application configuration.
//!
//! This module manages the application configuration file.

use serde::{Deserialize, Serialize};

const CONFIG_NAME: &str = "vocab-player";

/// Audio output used for playback.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Backend {
    /// Pretends to play each track for `simulated_track_ms`.
    Simulated,
    /// libmpv, when built with the `mpv` feature.
    Mpv,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub(crate) version: u32,
    /// Directory holding the vocabulary tables and audio tables.
    pub(crate) vocabulary_dir: String,
    pub(crate) database_file: String,
    pub(crate) audio_base_url: String,
    pub(crate) media_year: String,
    pub(crate) share_base_url: String,
    pub(crate) empty_category_sound: String,
    pub(crate) end_of_playback_sound: String,
    pub(crate) backend: Backend,
    pub(crate) simulated_track_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            vocabulary_dir: "data".to_string(),
            database_file: "vocab-player.db".to_string(),
            audio_base_url: "https://elearning.hakka.gov.tw/hakka/files/cert/vocabulary".to_string(),
            media_year: "112".to_string(),
            share_base_url: "https://example.org/drill/".to_string(),
            empty_category_sound: "empty_category.mp3".to_string(),
            end_of_playback_sound: "endOfPlay.mp3".to_string(),
            backend: Backend::Simulated,
            simulated_track_ms: 1500,
        }
    }
}

pub(crate) fn load_config() -> AppConfig {
    confy::load(CONFIG_NAME, None).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let cfg: AppConfig =
            serde_json::from_str(r#"{ "backend": "mpv", "media_year": "113" }"#).unwrap();

        assert_eq!(cfg.backend, Backend::Mpv);
        assert_eq!(cfg.media_year, "113");
        assert_eq!(cfg.simulated_track_ms, AppConfig::default().simulated_track_ms);
    }
}
