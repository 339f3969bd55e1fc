pub const DEFAULT_TRAVELER: &str = r#"# TRAVELER.md - Who You're Planning For

Everything here is handed to the planner with every request. Delete what
doesn't apply and fill in the rest.

## Home

- **Home city / airport**: [e.g. Osaka, KIX]
- **Paying currency**: [e.g. JPY]

## Budget

- Usual hotel budget per night: [e.g. 100 USD]
- Style: [Budget / Mid-range / Luxury]

## Food

- Dietary needs: [Vegetarian / Halal / None]
- Likes: [Street food, seafood, local markets]
- Dislikes: [Chain restaurants]

## Pace

- Early riser: [Yes / No]
- Walking tolerance: [Low / Medium / High]
- Interests: [Museums, architecture, nightlife, nature]

---

*Edit this file to change how wayfarer plans for you.*"#;
