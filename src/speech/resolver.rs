use log::{debug, warn};
use std::sync::Arc;

use crate::languages::LanguageProfile;

use super::{VoiceCatalog, VoiceInfo};

/// Primary voice plus an optional fallback for one language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVoices {
    pub primary: String,
    pub fallback: Option<String>,
}

impl ResolvedVoices {
    /// Voices to try, in order, without duplicates
    pub fn candidates(&self) -> Vec<String> {
        let mut voices = vec![self.primary.clone()];
        if let Some(fallback) = &self.fallback {
            if fallback != &self.primary {
                voices.push(fallback.clone());
            }
        }
        voices
    }

    /// Fallback that will actually be tried (one equal to the primary is not)
    pub fn effective_fallback(&self) -> Option<&str> {
        self.fallback.as_deref().filter(|fallback| *fallback != self.primary)
    }
}

/// Picks the voices used for a language
#[derive(Debug, Clone)]
pub struct VoiceResolver {
    catalog: Arc<dyn VoiceCatalog>,
}

impl VoiceResolver {
    pub fn new(catalog: Arc<dyn VoiceCatalog>) -> Self {
        Self { catalog }
    }

    /// Resolve the primary voice from the static table and a fallback from the catalog
    ///
    /// A catalog that cannot be queried (offline, engine missing) only costs the fallback.
    pub async fn resolve(&self, language: &LanguageProfile) -> ResolvedVoices {
        let fallback = match self.catalog.list_voices().await {
            Ok(voices) => {
                debug!("Voice catalog lists {} voices", voices.len());
                pick_fallback(&voices, language.locales)
            }
            Err(e) => {
                warn!("Could not query voice catalog, continuing without fallback voice: {}", e);
                None
            }
        };

        ResolvedVoices {
            primary: language.voice.to_string(),
            fallback,
        }
    }
}

/// First voice whose locale equals a ranked locale, else first whose locale starts with one
pub fn pick_fallback(voices: &[VoiceInfo], ranked_locales: &[&str]) -> Option<String> {
    let usable = || voices.iter().filter(|voice| !voice.id.is_empty());

    for locale in ranked_locales {
        if let Some(voice) = usable().find(|voice| voice.locale == *locale) {
            return Some(voice.id.clone());
        }
    }
    for locale in ranked_locales {
        if let Some(voice) = usable().find(|voice| voice.locale.starts_with(locale)) {
            return Some(voice.id.clone());
        }
    }
    None
}
