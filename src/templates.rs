pub const DEFAULT_STEPS_JSON: &str = include_str!("../templates/default_steps.json");
pub const WATERMARK_HTML: &str = include_str!("../templates/watermark.html");
