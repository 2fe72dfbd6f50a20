//! Fixed rubric prompt templates.
//!
//! These are configuration-grade text, kept out of the I/O path: varying
//! a rubric is a template change here, never a code-path change in the
//! scorer.

/// Rubric for analyzing a source image before background removal.
pub fn analyze_image() -> String {
    "Analyze this image for background removal purposes. Provide:\n\n\
     **Subject**: What's the main subject?\n\
     **Style**: Photo/cartoon/illustration/3D?\n\
     **Background**: Simple/complex/gradient/textured?\n\
     **Details**: Hair, fur, transparency, glow effects?\n\
     **Challenges**: What makes BG removal difficult?\n\
     **Recommended Category**: Portrait/E-commerce/Cartoon/Animals/Complex/Fine-Details/VFX/Transparent/Challenging\n\n\
     Keep under 150 words, be concise and specific."
        .to_string()
}

/// Rubric for scoring one background-removal result in isolation.
///
/// The closing instruction pins the response to the labeled-line format
/// the parser expects; everything before it pushes the model off the
/// everything-is-an-8 plateau.
pub fn score_single(provider_label: &str) -> String {
    format!(
        "You are an EXTREMELY CRITICAL professional image quality inspector. \
         Your reputation depends on finding even microscopic flaws. Examine this \
         background removal result from {provider_label} with a magnifying glass.\n\n\
         CRITICAL ANALYSIS REQUIRED - Look for TINY imperfections:\n\n\
         **Edge Accuracy (1-10)**:\n\
         - Inspect EVERY pixel along edges\n\
         - Look for: jagged pixels, halos (even faint ones), color bleeding, rough transitions\n\
         - Only give 9-10 if edges are ABSOLUTELY PERFECT at pixel level\n\
         - Give 5-7 for \"acceptable but not perfect\" results\n\
         - Give 1-4 if there are obvious flaws\n\n\
         **Detail Preservation (1-10)**:\n\
         - Check if ANY fine details are lost or softened\n\
         - Look for: blurriness, missing hair strands, lost texture, smoothing artifacts\n\
         - Give 9-10 ONLY if ALL details are razor-sharp and preserved\n\
         - Give 1-4 if significant detail loss\n\n\
         **Transparency Quality (1-10)**:\n\
         - Examine the alpha channel for ANY artifacts\n\
         - Look for: semi-transparent halos, uneven edges, residual background, fringing\n\
         - Give 9-10 ONLY if transparency is completely clean\n\
         - Give 1-4 if obvious transparency issues\n\n\
         BE HARSH. USE THE FULL 1-10 RANGE. Average results deserve 5-6, not 8.\n\n\
         Respond with ONLY three numbers, one per line:\n\
         Edge: [number 1-10]\n\
         Detail: [number 1-10]\n\
         Transparency: [number 1-10]"
    )
}

/// Rubric for ranking and scoring all results together.
///
/// Candidates are addressed by ordinal position ("Result 1", "Result 2")
/// so the parser can anchor on the ordinal regardless of label text.
pub fn score_comparative(candidates: &[(String, String)]) -> String {
    let results_list = candidates
        .iter()
        .enumerate()
        .map(|(index, (label, url))| format!("Result {} ({label}): {url}", index + 1))
        .collect::<Vec<_>>()
        .join("\n");
    let count = candidates.len();

    format!(
        "You are comparing {count} background removal results side-by-side. \
         RANK them from best to worst.\n\n\
         {results_list}\n\n\
         Examine ALL results carefully and COMPARE them:\n\
         - Which has the cleanest edges?\n\
         - Which preserves the most detail?\n\
         - Which has the best transparency?\n\n\
         IMPORTANT: Give DIFFERENT scores based on quality ranking:\n\
         - Best result: 9-10 for each metric\n\
         - Second best: 7-8\n\
         - Third: 6-7\n\
         - Fourth: 5-6\n\
         - Worst: 3-5\n\n\
         For EACH result (1-{count}), provide scores:\n\
         Result 1 - Edge: X, Detail: Y, Transparency: Z\n\
         Result 2 - Edge: X, Detail: Y, Transparency: Z\n\
         (continue for all results)"
    )
}
