/// Instruction for the analysis call.
pub fn style_analysis_prompt(count: usize) -> String {
    format!(
        concat!(
            "Analyze the person in this portrait. Infer their gender, approximate age and face shape. ",
            "Based on that analysis, recommend {count} distinct hairstyles that would suit them. ",
            "Vary the length, texture and formality across the set, and include 2-3 bold or creative options. ",
            "Return ONLY a JSON array of {count} objects with these exact fields: ",
            "id (number), label (a short display name of at most four words), ",
            "promptDescription (a detailed visual description of the hairstyle that an image model can follow)."
        ),
        count = count
    )
}

/// Instruction for one mutation call.
pub fn variation_prompt(style_description: &str) -> String {
    format!(
        concat!(
            "Edit this portrait so the person has the following hairstyle: {style}. ",
            "Keep the face, facial identity, gender and age exactly as in the original photo. ",
            "Frame the result as a headshot or half-body ID-style photo on a pure white background. ",
            "The output must be high resolution and photorealistic, ",
            "and the hair must blend naturally with the head and hairline."
        ),
        style = style_description.trim()
    )
}
