//! crates/flareonix_core/src/guide.rs
//!
//! Static content of the user guide, readable without signing in.

use serde::Serialize;

pub const PRODUCT_NAME: &str = "Flareonix";
pub const TAGLINE: &str = "AI-Driven Idea Clarity & Startup Readiness";
pub const DESCRIPTION: &str = "Flareonix provides founders with structured knowledge, honest evaluation, and clear insights before they commit capital. Our mission is to reduce avoidable failures by ensuring founders start with awareness, not assumptions.";

#[derive(Debug, Clone, Copy, Serialize)]
pub struct GuideStep {
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Guide {
    pub name: &'static str,
    pub tagline: &'static str,
    pub description: &'static str,
    pub steps: &'static [GuideStep],
}

pub static STEPS: [GuideStep; 4] = [
    GuideStep {
        title: "Input Your Spark",
        description: "Paste your raw startup idea into our Clarity Engine. Be as detailed or as brief as you want.",
    },
    GuideStep {
        title: "AI Deep Research",
        description: "Flareonix scours the web for real competitors, market trends, and failed similar startups.",
    },
    GuideStep {
        title: "Receive Readiness Score",
        description: "Get an honest percentage evaluation of your success probability based on current market saturation and demand.",
    },
    GuideStep {
        title: "Strategic Pivot",
        description: "If your score is low, our AI suggests a 'Version 2.0' of your idea to significantly improve its market readiness.",
    },
];

pub fn guide() -> Guide {
    Guide {
        name: PRODUCT_NAME,
        tagline: TAGLINE,
        description: DESCRIPTION,
        steps: &STEPS,
    }
}
