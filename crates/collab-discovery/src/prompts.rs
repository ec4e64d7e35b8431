//! Prompt contracts for the two generative-model calls.

use collab_core::BrandProfile;
use collab_gateway::GenerationConfig;

pub const ANALYSIS_SYSTEM: &str =
    "You are a brand analyst. Use web search to research thoroughly. Return only valid JSON.";

/// Low temperature: the profile should be factual.
pub const ANALYSIS_GENERATION: GenerationConfig = GenerationConfig {
    temperature: 0.3,
    top_k: 40,
    top_p: 0.95,
    max_output_tokens: 2048,
};

/// Higher temperature for varied recommendations; room for 15 brands and 25 products.
pub const RECOMMENDATION_GENERATION: GenerationConfig = GenerationConfig {
    temperature: 0.85,
    top_k: 50,
    top_p: 0.97,
    max_output_tokens: 6144,
};

#[must_use]
pub fn analysis_prompt(domain: &str) -> String {
    format!(
        r#"You are a brand strategist who knows DTC e-commerce, CPG and lifestyle brands well.

TASK: Analyze this brand in depth. The analysis will be used to find collaboration partners.

INPUT URL: {domain}

Research the brand with web search: its website, press coverage and social presence.

Respond with JSON in exactly this shape:

{{
  "brandProfile": {{
    "name": "Brand Name",
    "url": "https://full-url.com",
    "tagline": "Tagline or positioning statement, if any",
    "productAnalysis": {{
      "primaryCategory": "e.g. Specialty Foods, Skincare, Home Goods",
      "subcategories": ["specific product types they sell"],
      "heroProducts": ["their 2-3 signature items"],
      "priceRange": {{
        "tier": "budget|mid-market|premium|luxury",
        "typicalPrice": "$XX-$XX"
      }}
    }},
    "brandDNA": {{
      "aesthetic": "2-3 words on visual style",
      "personality": "2-3 words on brand voice",
      "coreValues": ["sustainability", "craftsmanship"],
      "originStory": "One sentence on the founding story, if known"
    }},
    "targetCustomer": {{
      "persona": "A specific description of the core customer",
      "lifestyle": "The broader lifestyle this customer leads",
      "occasions": ["when and why they buy"],
      "adjacentInterests": ["what else this customer cares about"]
    }},
    "marketPosition": {{
      "competitors": ["2-3 direct competitors"],
      "differentiator": "What sets them apart",
      "brandStage": "emerging|growing|established|iconic"
    }},
    "description": "Three sentences: what they sell and how, who buys it, and what makes the brand notable."
  }}
}}

Be specific. Vague analysis produces weak recommendations."#
    )
}

#[must_use]
pub fn recommendation_system(brand_name: &str) -> String {
    format!(
        "You are an expert brand collaboration curator. Recommendations must be specific, creative and commercially viable.

RULES:
1. Research every brand with Google Search before recommending it.
2. Return ONLY valid JSON with no markdown and no text outside the JSON.
3. Brand URLs must come from search results. Never construct or guess a URL.
4. Give concrete reasons; generic reasoning is not acceptable.
5. Never recommend products from {brand_name}."
    )
}

/// Recommendation prompt for `profile`, with the feedback digest appended to
/// the research section.
///
/// # Errors
///
/// Returns a [`serde_json::Error`] if the profile cannot be rendered as JSON.
pub fn recommendation_prompt(
    profile: &BrandProfile,
    brand_name: &str,
    domain: &str,
    feedback_context: &str,
) -> Result<String, serde_json::Error> {
    let profile_json = serde_json::to_string_pretty(profile)?;
    Ok(format!(
        r#"You curate brand collaborations: part trend forecaster, part matchmaker.

Find brands that would make exceptional, unexpected and commercially viable collaboration partners for the brand below.

=== BRAND SEEKING COLLABORATORS ===
{profile_json}

=== WHAT MAKES A GOOD COLLABORATION ===
1. Complementary products that enhance each other, never competing ones.
2. Shared customer values while introducing something new.
3. A partnership story that is obvious and compelling.
4. Both brands benefit; neither trades down.
5. A concrete bundle or campaign is easy to picture.

=== COLLABORATION ANGLES ===
Classify each brand with ONE category:
- "same-moment": used in the same occasion or ritual
- "same-aesthetic": shared design language across categories
- "same-values": aligned mission, different products
- "gift-pairing": belongs in a gift set together
- "lifestyle-stack": part of the same customer's wider identity
- "unexpected-delight": a non-obvious pairing with a story

=== DIVERSITY REQUIREMENTS ===
The 12-15 brands MUST include:
- at least 5 emerging brands (founded 2020 or later, under $10M revenue)
- at least 4 established, well-known brands
- at least 1 non-obvious category (digital product, subscription, experience)
- a mix of price points that suits this customer
- NO direct competitors

=== NEVER RECOMMEND ===
- ANY product from {brand_name} or {domain}; partners must be external
- obvious defaults that would fit any brand in the category
- Amazon private label or mass-market brands without a story
- commodity brands with no identity
- products you cannot verify exist

=== RESEARCH ===
{feedback_context}
For each brand: confirm it exists and is active, take its homepage URL from search results, find its social handles, and find 2-4 specific products.

=== OUTPUT FORMAT ===
Return valid JSON only:

{{
  "brands": [
    {{
      "name": "Brand Name",
      "url": "https://actualbrandwebsite.com",
      "category": "same-moment|same-aesthetic|same-values|gift-pairing|lifestyle-stack|unexpected-delight",
      "brandStage": "emerging|growing|established",
      "reason": "2-3 sentences on the specific synergy with {brand_name}",
      "bundleIdea": "One sentence describing a bundle or campaign",
      "social": {{ "tiktok": "handle or null", "instagram": "handle or null", "facebook": "handle or null" }}
    }}
  ],
  "products": [
    {{
      "productName": "Exact product name as listed on the brand's site",
      "brandName": "Brand Name (must not be {brand_name})",
      "brandDomain": "brandname.com",
      "whyThisProduct": "One sentence on why it pairs well",
      "suggestedBundle": "Which {brand_name} product it pairs with",
      "estimatedPrice": "$XX",
      "social": {{ "tiktok": "handle or null", "instagram": "handle or null", "facebook": "handle or null" }}
    }}
  ]
}}

Requirements:
- 12-15 brands meeting the diversity requirements
- 20-25 products, at least 2 per recommended brand
- ZERO products from {brand_name}
- real, searchable product names
- brand URLs are real homepages from search results"#
    ))
}
