use crate::models::MatchRequest;

pub const SYSTEM_PROMPT: &str = "You are an expert in urban geography and city neighborhoods.";

/// Build the user prompt asking the model for a JSON array of matches
pub fn build_prompt(request: &MatchRequest) -> String {
    let MatchRequest { city1, country1, city2, country2 } = request;

    format!(
        r#"Match similar neighborhoods between {city1}, {country1} and {city2}, {country2}.

For each match, provide:
1. The neighborhood name in {city1}
2. A brief description of that neighborhood
3. The matching neighborhood name in {city2}
4. A brief description of that neighborhood
5. Why they are similar
6. Key characteristics they share

Find 5-7 meaningful matches based on characteristics like:
- Demographics and social character
- Economic status and development
- Cultural vibe and lifestyle
- Urban layout and architecture
- Historical significance
- Entertainment and nightlife
- Business and commercial activity

Return a JSON array with this structure:
[
    {{
        "neighborhood1": "name",
        "neighborhood1_description": "description",
        "neighborhood2": "name",
        "neighborhood2_description": "description",
        "similarity_reason": "why they match",
        "characteristics": ["characteristic1", "characteristic2"]
    }}
]

Only return the JSON array, no additional text."#
    )
}
