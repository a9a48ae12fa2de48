//! Prompt construction for every generation stage.
//!
//! Prompts are built from session data here so both client implementations
//! send identical wording. The analyze prompt fixes the labeled-section
//! format that [`crate::parser`] reads back.

use clab_models::{Gender, Language, ProductData, ScriptEdit, ScriptStyle};

/// Number of selling points quoted in the script prompt.
pub const SCRIPT_KEY_POINTS: usize = 2;

/// Camera setups used for batch image variations.
pub const SHOT_VARIATIONS: [&str; 4] = [
    "Front-facing medium shot, product held at chest height.",
    "Close-up on the product in the model's hands, shallow depth of field.",
    "Three-quarter angle, model looking at the product.",
    "Lifestyle wide shot, product in natural everyday use.",
];

/// Analysis prompt asking for the labeled-section format.
pub fn analyze_prompt(url: &str, language: Language) -> String {
    format!(
        "Analyze the following product URL to extract detailed product knowledge: {url}\n\
         I need you to act as a marketing expert. Please search for this product and provide a comprehensive summary.\n\
         CRITICAL: Provide the output content in {lang}.\n\
         Format the output as a plain text block. Do not use JSON.\n\
         Structure the text strictly like this:\n\
         Name: [Product Name]\n\
         Description: [2-3 sentences description]\n\
         Visual Features: [Physical appearance, colors, materials, packaging]\n\
         Target Audience: [Who is this for?]\n\
         Selling Points:\n\
         - [Point 1]\n\
         - [Point 2]\n\
         - [Point 3]",
        url = url,
        lang = language.instruction(),
    )
}

/// Model image prompt for a product and presenter gender.
pub fn model_image_prompt(product: &ProductData, gender: Gender) -> String {
    format!(
        "Create a high-quality, photorealistic commercial advertising image.\n\
         Subject: An attractive Indonesian {gender} model.\n\
         Action: The model is holding or using a product described as: {name}.\n\
         Product Visuals: {visuals}.\n\
         Outfit: Stylish, modern outfit suitable for: {audience}.\n\
         Background: Blurred, professional commercial background that fits the product vibe (e.g., modern home, studio, outdoor nature).\n\
         Lighting: Cinematic, soft studio lighting.\n\
         Style: 4k, highly detailed, advertising photography.\n\
         Ensure the product looks natural in the model's hand/use.",
        gender = gender,
        name = product.name,
        visuals = product.visual_features,
        audience = product.target_audience,
    )
}

/// `count` variations of `base`, cycling through [`SHOT_VARIATIONS`].
pub fn image_variations(base: &str, count: usize) -> Vec<String> {
    SHOT_VARIATIONS
        .iter()
        .cycle()
        .take(count)
        .map(|shot| format!("{}\nCamera: {}", base, shot))
        .collect()
}

fn length_instruction(style: ScriptStyle) -> &'static str {
    match style {
        ScriptStyle::Short => {
            "VERY SHORT. STRICTLY UNDER 30 seconds read time (Max 60 words). Keep it punchy."
        }
        ScriptStyle::Normal => "Standard 45 seconds.",
    }
}

/// Voiceover script prompt.
pub fn script_prompt(
    product: &ProductData,
    gender: Gender,
    language: Language,
    style: ScriptStyle,
) -> String {
    format!(
        "Write a catchy, persuasive commercial script (voiceover only) for a video advertisement.\n\
         Product: {name}\n\
         Audience: {audience}\n\
         Key Points: {points}\n\
         Model in video: Indonesian {gender}\n\
         Tone: Enthusiastic, professional, yet relatable.\n\
         Language: {lang}.\n\
         Length: {length}.\n\
         Structure: Hook -> Benefit -> Call to Action.\n\
         Return ONLY the raw script text to be read by the voice actor. Do not include [Scene] or (Action) cues.",
        name = product.name,
        audience = product.target_audience,
        points = product.key_points(SCRIPT_KEY_POINTS),
        gender = gender,
        lang = language.instruction(),
        length = length_instruction(style),
    )
}

/// Prompt rewriting `current` according to `edit`.
pub fn modify_script_prompt(current: &str, edit: ScriptEdit, language: Language) -> String {
    let lang = language.instruction();
    let instruction = match edit {
        ScriptEdit::Shorten => format!(
            "Rewrite the following commercial script to be shorter (approx 15-20 seconds). Max 40 words. Keep the language {}.",
            lang
        ),
        ScriptEdit::Expand => format!(
            "Expand the following commercial script to include more details (approx 50 seconds). Keep the language {}.",
            lang
        ),
        ScriptEdit::Regenerate => format!(
            "Rewrite the following commercial script with a completely different tone but keeping the core message and SAME LENGTH (approx {} words). Keep the language {}.",
            current.split_whitespace().count(),
            lang
        ),
    };

    format!(
        "Original Script: \"{}\"\nInstruction: {}\nReturn ONLY the raw new script text.",
        current, instruction
    )
}

/// Video prompt; the presenter keeps a closed mouth since the voiceover is
/// laid over separately.
pub fn video_prompt(details: &str) -> String {
    format!(
        "Cinematic commercial shot.\n\
         The model is {details}.\n\
         CRITICAL: The model MUST KEEP THEIR MOUTH CLOSED. The model IS NOT SPEAKING.\n\
         Expression: Confident smile, professional, engaging but silent.\n\
         Action: Showing the product to the camera.\n\
         Subtle camera push in.\n\
         High production value, 4k advertising style.",
        details = details,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> ProductData {
        let mut p = ProductData::placeholder("https://shop.example/mug");
        p.name = "Thermo Mug".into();
        p.visual_features = "Matte black steel".into();
        p.target_audience = "Commuters".into();
        p.selling_points = vec!["Keeps heat 12h".into(), "Leak proof".into(), "Light".into()];
        p
    }

    #[test]
    fn test_analyze_prompt_fixes_labels() {
        let prompt = analyze_prompt("https://shop.example/mug", Language::En);
        for label in ["Name:", "Description:", "Visual Features:", "Target Audience:", "Selling Points:"] {
            assert!(prompt.contains(label), "{label}");
        }
        assert!(prompt.contains("CRITICAL: Provide the output content in English."));
    }

    #[test]
    fn test_script_prompt_uses_first_two_points() {
        let prompt = script_prompt(&product(), Gender::Male, Language::Id, ScriptStyle::Short);
        assert!(prompt.contains("Key Points: Keeps heat 12h, Leak proof\n"));
        assert!(prompt.contains("Model in video: Indonesian male"));
        assert!(prompt.contains("Language: Bahasa Indonesia."));
        assert!(prompt.contains("Max 60 words"));
    }

    #[test]
    fn test_model_prompt_mentions_product() {
        let prompt = model_image_prompt(&product(), Gender::Female);
        assert!(prompt.contains("Indonesian female model"));
        assert!(prompt.contains("Product Visuals: Matte black steel."));
        assert!(prompt.contains("suitable for: Commuters."));
    }

    #[test]
    fn test_regenerate_keeps_word_count() {
        let prompt = modify_script_prompt("one two  three\nfour", ScriptEdit::Regenerate, Language::En);
        assert!(prompt.contains("(approx 4 words)"));
        assert!(prompt.starts_with("Original Script: \"one two  three\nfour\"\nInstruction: "));
        assert!(prompt.ends_with("Return ONLY the raw new script text."));
    }

    #[test]
    fn test_shorten_prompt() {
        let prompt = modify_script_prompt("x", ScriptEdit::Shorten, Language::Id);
        assert!(prompt.contains("Max 40 words. Keep the language Bahasa Indonesia."));
    }

    #[test]
    fn test_image_variations_cycle() {
        let prompts = image_variations("base", 5);
        assert_eq!(prompts.len(), 5);
        assert_eq!(prompts[0], prompts[4]);
        assert_ne!(prompts[0], prompts[1]);
    }

    #[test]
    fn test_video_prompt() {
        let prompt = video_prompt(&product().video_subject());
        assert!(prompt.contains("The model is Thermo Mug, Matte black steel."));
        assert!(prompt.contains("MUST KEEP THEIR MOUTH CLOSED"));
    }
}
