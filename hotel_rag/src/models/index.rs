use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Index generation. An index name is permanently bound to one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Generation {
    Lexical,
    DenseV1,
    DenseV2,
}

impl Generation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Generation::Lexical => "lexical",
            Generation::DenseV1 => "dense-v1",
            Generation::DenseV2 => "dense-v2",
        }
    }

    pub fn descriptor(&self) -> &'static IndexDescriptor {
        match self {
            Generation::Lexical => &LEXICAL_INDEX,
            Generation::DenseV1 => &DENSE_V1_INDEX,
            Generation::DenseV2 => &DENSE_V2_INDEX,
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Generation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lexical" => Ok(Generation::Lexical),
            "dense-v1" | "dense" | "v1" => Ok(Generation::DenseV1),
            "dense-v2" | "v2" => Ok(Generation::DenseV2),
            other => Err(format!("unknown index generation: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityFunction {
    /// Substring containment over a text property.
    Substring,
    Cosine,
}

impl SimilarityFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityFunction::Substring => "substring",
            SimilarityFunction::Cosine => "cosine",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDescriptor {
    pub name: &'static str,
    pub generation: Generation,
    /// Node property the index covers.
    pub property: &'static str,
    /// Vector length; `None` for the text index.
    pub dimension: Option<usize>,
    pub similarity: SimilarityFunction,
}

pub const LEXICAL_INDEX: IndexDescriptor = IndexDescriptor {
    name: "hotel_search_text",
    generation: Generation::Lexical,
    property: "search_text",
    dimension: None,
    similarity: SimilarityFunction::Substring,
};

pub const DENSE_V1_INDEX: IndexDescriptor = IndexDescriptor {
    name: "hotel_embeddings",
    generation: Generation::DenseV1,
    property: "embedding",
    dimension: Some(384),
    similarity: SimilarityFunction::Cosine,
};

pub const DENSE_V2_INDEX: IndexDescriptor = IndexDescriptor {
    name: "hotel_embeddings_v2",
    generation: Generation::DenseV2,
    property: "embedding_v2",
    dimension: Some(768),
    similarity: SimilarityFunction::Cosine,
};
