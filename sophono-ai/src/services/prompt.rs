//! Prompt synthesis
//!
//! Renders extracted features and heuristic results into the natural-language
//! requests sent to the text-generation collaborator. Pure string building.

use std::fmt::Write;

use crate::analysis::dsp::N_MFCC;
use crate::analysis::{AcousticFeatures, ViralHeuristicResult};

/// Interpretive label and two reading hints per MFCC coefficient
pub const MFCC_GUIDE: [(&str, [&str; 2]); N_MFCC] = [
    (
        "Brightness/High Frequency Energy",
        [
            "Higher values mean brighter, more present vocals",
            "Lower values suggest warmer, more mellow tones",
        ],
    ),
    (
        "Sharpness/Attack Quality",
        [
            "Higher values indicate sharper vocal articulation",
            "Lower values suggest smoother vocal transitions",
        ],
    ),
    (
        "Instrument Harshness",
        [
            "Higher values may indicate harshness in instrumentation",
            "Lower values suggest smoother instrumental backing",
        ],
    ),
    (
        "Vocal Clarity",
        [
            "Higher values mean clearer vocal presence",
            "Lower values suggest more blended or distant vocals",
        ],
    ),
    (
        "Mid-Range Punch",
        [
            "Higher values indicate stronger mid-range presence",
            "Important for vocal intelligibility",
        ],
    ),
    (
        "Bass Presence",
        [
            "Higher values mean stronger bass foundation",
            "Lower values suggest a thinner low-end",
        ],
    ),
    (
        "Warmth/Low-Mid Balance",
        [
            "Higher values indicate warmer, fuller sound",
            "Important for emotional resonance",
        ],
    ),
    (
        "Metallic/Organic Balance",
        [
            "Higher values suggest more metallic/artificial tones",
            "Lower values indicate more organic/natural sound",
        ],
    ),
    (
        "Harmonic Complexity",
        [
            "Higher values mean more complex harmonies",
            "Lower values suggest simpler arrangements",
        ],
    ),
    (
        "Fundamental Bass",
        [
            "Higher values indicate stronger fundamental frequencies",
            "Affects the \"fullness\" of the overall sound",
        ],
    ),
    (
        "Room Acoustics",
        [
            "Higher values suggest more reverb/room sound",
            "Lower values indicate drier, more intimate recordings",
        ],
    ),
    (
        "Ultra-Low Rumble",
        [
            "Higher values may indicate excessive sub-bass",
            "Can affect streaming platform compatibility",
        ],
    ),
    (
        "Spectral Shape",
        [
            "Overall timbral quality indicator",
            "Helps identify unique sonic characteristics",
        ],
    ),
];

/// Song assessment request
///
/// Asks for a 0–100 score inside `<final></final>` tags, a multi-paragraph
/// summary and improvement suggestions, with every MFCC explained and no
/// asterisk formatting.
pub fn music_prompt(features: &AcousticFeatures, viral: &ViralHeuristicResult) -> String {
    let mut prompt = String::with_capacity(4096);

    prompt.push_str(
        "Analyze the following song data and provide a comprehensive assessment of its \
         viral potential on a scale of 0-100, along with a detailed explanation:\n\n",
    );

    prompt.push_str("=== Acoustic Features ===\n");
    let _ = writeln!(prompt, "- Tempo: {:.1} BPM", features.tempo);
    let _ = writeln!(prompt, "- Spectral Centroid (brightness): {:.2}", features.spectral_centroid);
    let _ = writeln!(prompt, "- Zero Crossing Rate (noisiness): {:.4}", features.zero_crossing_rate);
    let _ = writeln!(prompt, "- RMS Energy (loudness): {:.4}", features.rms);

    prompt.push_str("\n=== MFCC Analysis (Important for Vocal and Instrument Characteristics) ===\n");
    for (i, ((label, hints), value)) in MFCC_GUIDE.iter().zip(&features.mfcc).enumerate() {
        let number = i + 1;
        let indent = if number < 10 { "   " } else { "    " };
        let _ = writeln!(prompt, "{}. MFCC {} ({}): {:.4}", number, number, label, value);
        for hint in hints {
            let _ = writeln!(prompt, "{}- {}", indent, hint);
        }
        prompt.push('\n');
    }

    prompt.push_str("=== Viral Trend Analysis ===\n");
    let _ = writeln!(prompt, "- Viral Potential Score: {}/4", viral.score);
    let _ = writeln!(
        prompt,
        "- Tempo Check: {}",
        if viral.tempo_passed() { "Good (110-130 BPM)" } else { "Outside ideal range" }
    );
    let _ = writeln!(
        prompt,
        "- Energy Check: {}",
        if viral.energy_passed() { "Strong" } else { "Weak" }
    );
    let _ = writeln!(prompt, "- Repetition: {} segments", viral.segments);
    let _ = writeln!(prompt, "- 15s Highlight: {}", viral.highlight_check);

    prompt.push_str(
        "\n=== Your Task ===\n\
         1. Combine all these factors to calculate a final score between 0-100 for the song's viral potential\n\
         2. Format your response with:\n   \
            - Final Score: [0-100] within <final></final> tags\n   \
            - Summary: [2-3 paragraph detailed analysis focusing on both technical and artistic aspects]\n\
         3. Provide specific, actionable suggestions for improvement considering:\n   \
            - Vocal production adjustments based on MFCC analysis\n   \
            - Instrumentation tweaks to enhance viral appeal\n   \
            - Arrangement modifications to highlight strengths\n\
         4. Explain how current features compare to trending songs in similar genres\n\
         5. Highlight any unique sonic characteristics that could be emphasized\n\
         6. EXPLAIN IN THE OUTPUT EVERY MFCC VALUE AND WHAT IT MEANS\n\
         7. DONT GIVE ASTERISK\n",
    );

    prompt
}

/// Lyrics assessment request: eight analysis points, genre in `<genre></genre>` tags
pub fn lyrics_prompt(lyrics: &str) -> String {
    format!(
        "Analyze the following song lyrics and provide a detailed assessment:\n\n\
         Lyrics:\n\
         {lyrics}\n\n\
         Your analysis should include:\n\
         1. Emotional appeal and relatability\n\
         2. Catchiness and memorability of phrases\n\
         3. Repetition and hook effectiveness\n\
         4. Current trends in popular music lyrics\n\
         5. Potential audience reach\n\
         6. Genre analysis (output in <genre></genre> tags)\n\
         7. Comparison with popular songs in this genre\n\
         8. Viral potential score (1-10) based on lyrics alone\n\n\
         Format your response with clear sections for each analysis point.\n"
    )
}
