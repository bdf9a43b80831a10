use anyhow::{Result, anyhow};
use isolang::Language;

/// Supported narration languages
///
/// Each supported ISO 639-1 code maps to one curated neural voice and a ranked
/// list of acceptable locales used when looking for a fallback voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageProfile {
    /// ISO 639-1 code accepted on the command line
    pub code: &'static str,
    /// Curated primary voice
    pub voice: &'static str,
    /// Acceptable locales, most preferred first
    pub locales: &'static [&'static str],
}

/// Language used when nothing else is configured
pub const DEFAULT_LANGUAGE: &str = "en";

/// The 27 supported languages
pub static LANGUAGES: [LanguageProfile; 27] = [
    LanguageProfile { code: "ar", voice: "ar-EG-SalmaNeural", locales: &["ar-EG", "ar-SA", "ar-AE"] },
    LanguageProfile { code: "bn", voice: "bn-IN-TanishaaNeural", locales: &["bn-IN", "bn-BD"] },
    LanguageProfile { code: "zh", voice: "zh-CN-XiaoxiaoNeural", locales: &["zh-CN", "zh-TW", "zh-HK"] },
    LanguageProfile { code: "nl", voice: "nl-NL-FennaNeural", locales: &["nl-NL", "nl-BE"] },
    LanguageProfile { code: "en", voice: "en-US-JennyNeural", locales: &["en-US", "en-GB", "en-AU", "en-CA"] },
    LanguageProfile { code: "fr", voice: "fr-FR-DeniseNeural", locales: &["fr-FR", "fr-CA"] },
    LanguageProfile { code: "de", voice: "de-DE-KatjaNeural", locales: &["de-DE", "de-AT", "de-CH"] },
    LanguageProfile { code: "el", voice: "el-GR-AthinaNeural", locales: &["el-GR"] },
    LanguageProfile { code: "hi", voice: "hi-IN-SwaraNeural", locales: &["hi-IN"] },
    LanguageProfile { code: "id", voice: "id-ID-GadisNeural", locales: &["id-ID"] },
    LanguageProfile { code: "it", voice: "it-IT-ElsaNeural", locales: &["it-IT"] },
    LanguageProfile { code: "ja", voice: "ja-JP-NanamiNeural", locales: &["ja-JP"] },
    LanguageProfile { code: "jv", voice: "jv-ID-SitiNeural", locales: &["jv-ID"] },
    LanguageProfile { code: "ko", voice: "ko-KR-SunHiNeural", locales: &["ko-KR"] },
    LanguageProfile { code: "ms", voice: "ms-MY-YasminNeural", locales: &["ms-MY"] },
    LanguageProfile { code: "mr", voice: "mr-IN-AarohiNeural", locales: &["mr-IN"] },
    LanguageProfile { code: "pl", voice: "pl-PL-AgnieszkaNeural", locales: &["pl-PL"] },
    LanguageProfile { code: "pt", voice: "pt-BR-FranciscaNeural", locales: &["pt-BR", "pt-PT"] },
    LanguageProfile { code: "ru", voice: "ru-RU-SvetlanaNeural", locales: &["ru-RU"] },
    LanguageProfile { code: "es", voice: "es-ES-ElviraNeural", locales: &["es-ES", "es-MX", "es-US"] },
    LanguageProfile { code: "sv", voice: "sv-SE-SofieNeural", locales: &["sv-SE"] },
    LanguageProfile { code: "ta", voice: "ta-IN-PallaviNeural", locales: &["ta-IN"] },
    LanguageProfile { code: "te", voice: "te-IN-ShrutiNeural", locales: &["te-IN"] },
    LanguageProfile { code: "th", voice: "th-TH-PremwadeeNeural", locales: &["th-TH"] },
    LanguageProfile { code: "tr", voice: "tr-TR-EmelNeural", locales: &["tr-TR"] },
    LanguageProfile { code: "ur", voice: "ur-PK-UzmaNeural", locales: &["ur-PK", "ur-IN"] },
    LanguageProfile { code: "vi", voice: "vi-VN-HoaiMyNeural", locales: &["vi-VN"] },
];

/// All supported codes, in table order
pub fn supported_codes() -> Vec<&'static str> {
    LANGUAGES.iter().map(|profile| profile.code).collect()
}

/// Look up the profile for a language code
pub fn profile(code: &str) -> Result<&'static LanguageProfile> {
    let normalized_code = code.trim().to_lowercase();
    LANGUAGES
        .iter()
        .find(|profile| profile.code == normalized_code)
        .ok_or_else(|| anyhow!("Unsupported language code: {} (supported: {})", code, supported_codes().join(" ")))
}

/// Check whether a code is one of the supported languages
pub fn is_supported(code: &str) -> bool {
    profile(code).is_ok()
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();
    let lang = Language::from_639_1(&normalized_code)
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))?;

    Ok(lang.to_name().to_string())
}
