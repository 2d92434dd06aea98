use crate::models::Niche;

/// Ordered keyword table. The first niche with any keyword found in the text wins,
/// so the order of this table decides ties.
pub const NICHE_KEYWORDS: &[(Niche, &[&str])] = &[
    (
        Niche::Electronics,
        &[
            "smartphone", "celular", "iphone", "samsung", "tv", "notebook", "laptop", "fone",
            "headphone", "tablet", "console", "playstation", "xbox", "câmera", "drone",
        ],
    ),
    (
        Niche::Fashion,
        &[
            "vestido", "calça", "camisa", "tênis", "sapato", "bolsa", "roupa", "blusa", "saia",
            "jaqueta", "casaco", "moda",
        ],
    ),
    (
        Niche::Home,
        &[
            "sofá", "cama", "mesa", "cadeira", "geladeira", "fogão", "microondas",
            "máquina de lavar", "aspirador", "panela", "colchão",
        ],
    ),
    (
        Niche::Beauty,
        &[
            "perfume", "maquiagem", "creme", "shampoo", "condicionador", "hidratante", "batom",
            "base", "rímel", "skincare",
        ],
    ),
];

/// Keyword based niche lookup over title and description.
pub fn classify(title: &str, description: Option<&str>) -> Niche {
    let text = format!("{} {}", title, description.unwrap_or_default()).to_lowercase();

    NICHE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| text.contains(kw)))
        .map(|(niche, _)| *niche)
        .unwrap_or(Niche::Uncategorized)
}

/// Parse a niche hint supplied by the feed. Unknown hints count as no hint.
pub fn from_hint(hint: Option<&str>) -> Option<Niche> {
    hint.filter(|h| !h.trim().is_empty())
        .and_then(|h| h.parse::<Niche>().ok())
}
