//! Static emotion prompt presets for reaction video generation.
//!
//! Each variant pairs a short label (used in output filenames) with the full
//! text prompt sent to the generation API. The table is fixed at compile time
//! and never mutated at runtime.

use crate::images::ImageCategory;

/// A named emotional reaction preset bound to a fixed text prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptVariant {
    /// Short label, used as the filename suffix (e.g. "surprised").
    pub label: &'static str,
    /// Full prompt text sent verbatim to the generation API.
    pub text: &'static str,
}

/// Label of the variant reserved for crying-category images.
pub const CRYING_LABEL: &str = "crying";

/// All emotion presets, crying last.
pub const VARIANTS: &[PromptVariant] = &[
    PromptVariant {
        label: "surprised",
        text: "Animate the person in the image reacting with subtle shocked surprise. Their eyes widen, eyebrows lift sharply, and their mouth opens slightly in shock. The motion should feel natural and quick, like they've just seen something unexpected. Maintain the original framing — if the person's arm is extended under the camera, keep it consistent as a selfie, otherwise keep it as a front-facing UGC style shot. No changes to the background or setting. Do not remove or change the position of the arm or hand holding the phone underneath the camera — preserve it exactly as in the base image. Add very subtle, natural handheld camera sway and pivot, as if the phone is being held in the person's hand, so the framing feels like a real TikTok selfie.",
    },
    PromptVariant {
        label: "sad",
        text: "Animate the person in the image reacting with subtle sadness. Their eyes soften and grow slightly glassy, eyelids lowering as if weighed down. Their eyebrows angle upward in the middle, creating a vulnerable, sorrowful expression. A small downward tilt of the head or shoulders adds to the feeling of heaviness. The motion should feel natural and tender, like they've just been hit with an emotional thought. Maintain the original framing — if the person's arm is extended under the camera, keep it consistent as a selfie, otherwise keep it as a front-facing UGC style shot. Do not remove or change the position of the arm or hand holding the phone underneath the camera — preserve it exactly as in the base image. Add very subtle, natural handheld camera sway and pivot, as if the phone is being held in the person's hand, so the framing feels like a real TikTok selfie.",
    },
    PromptVariant {
        label: "confused",
        text: "Animate the person in the image reacting with visible confusion while keeping their gaze locked directly at the camera. Their eyebrows knit together and raise unevenly, their eyes narrow slightly with puzzlement, and their mouth shifts into a subtle frown or half-open, questioning expression. A small head tilt or slight micro-shake emphasizes the confusion, but their eyes never leave the lens, as if they're baffled by the viewer or what they're seeing on screen. The motion should feel natural, quick, and clearly readable. Maintain the original framing — if the person's arm is extended under the camera, keep it consistent as a selfie, otherwise keep it as a front-facing UGC style shot. Do not remove or change the position of the arm or hand holding the phone underneath the camera — preserve it exactly as in the base image. Add very subtle, natural handheld camera sway and pivot, as if the phone is being held in the person's hand, so the framing feels like a real TikTok selfie.",
    },
    PromptVariant {
        label: "romantic",
        text: "Animate the person in the image reacting with a shy, romantic expression, as if they've just felt butterflies in their stomach. Their eyes glance down briefly, then lift back up with a soft, lingering gaze full of affection. A gentle blush appears across their cheeks, and their lips curl into a nervous but sweet smile that wavers slightly, as if they can't hide their feelings. Their head tilts down or to the side in a bashful way, adding to the sense of vulnerability. The motion should feel natural, tender, and slightly flustered, as if they're caught in an unexpected romantic moment. Maintain the original framing — if the person's arm is extended under the camera, keep it consistent as a selfie, otherwise keep it as a front-facing UGC style shot. Do not remove or change the position of the arm or hand holding the phone underneath the camera — preserve it exactly as in the base image. Add very subtle, natural handheld camera sway and pivot, as if the phone is being held in the person's hand, so the framing feels like a real TikTok selfie.",
    },
    PromptVariant {
        label: "crying",
        text: "Animate the person in the image beginning to cry with genuine emotion. Their eyes well up with tears that glisten and start to fall down their cheeks. Their eyebrows draw together in anguish, their lower lip trembles slightly, and their breathing becomes shaky and uneven. Their face contorts with raw emotion as they try to hold back sobs. The motion should feel deeply emotional and authentic, like they're experiencing overwhelming sadness or pain. Maintain the original framing — if the person's arm is extended under the camera, keep it consistent as a selfie, otherwise keep it as a front-facing UGC style shot. Do not remove or change the position of the arm or hand holding the phone underneath the camera — preserve it exactly as in the base image. Add very subtle, natural handheld camera sway and pivot, as if the phone is being held in the person's hand, so the framing feels like a real TikTok selfie.",
    },
];

/// Select the prompt variants applicable to an image category.
///
/// Crying images get exactly the crying variant; all other images get every
/// variant except crying. The selection is deterministic and side-effect free.
pub fn variants_for(category: ImageCategory) -> Vec<PromptVariant> {
    match category {
        ImageCategory::Crying => VARIANTS
            .iter()
            .copied()
            .filter(|v| v.label == CRYING_LABEL)
            .collect(),
        ImageCategory::Standard => VARIANTS
            .iter()
            .copied()
            .filter(|v| v.label != CRYING_LABEL)
            .collect(),
    }
}
