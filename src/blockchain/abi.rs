//! Contract bindings built from the JSON ABI file.
//!
//! The ABI is inspected once at startup: required entry points are looked
//! up, and the strategy for counting articles is fixed here so calls never
//! have to re-decide it.

use alloy::dyn_abi::{DynSolType, DynSolValue, FunctionExt, JsonAbiExt, Specifier};
use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::{hex, Address, Bytes};
use std::path::Path;

use crate::blockchain::types::{Article, BlockchainError, BlockchainResult};

const SUBMIT_ARTICLE: &str = "submitArticle";
const VOTE_ARTICLE: &str = "voteArticle";
const GET_ARTICLE: &str = "getArticle";
const ARTICLES_LENGTH: &str = "articlesLength";
const ARTICLES: &str = "articles";

/// How the total article count is obtained.
#[derive(Debug, Clone)]
pub enum ArticleCount {
    /// Zero-argument `articlesLength()` returning an integer.
    Accessor(Function),
    /// Zero-argument `articles()` returning the whole collection.
    CollectionLength(Function),
}

impl ArticleCount {
    fn function(&self) -> &Function {
        match self {
            ArticleCount::Accessor(f) | ArticleCount::CollectionLength(f) => f,
        }
    }
}

/// Immutable binding of contract address and the entry points this service uses.
#[derive(Debug, Clone)]
pub struct ContractBindings {
    address: Address,
    submit_article: Function,
    vote_article: Function,
    get_article: Function,
    count: ArticleCount,
}

impl ContractBindings {
    /// Load the ABI from `path` and bind it to `address`.
    ///
    /// Accepts either a bare ABI array or an artifact object with an `abi` key.
    pub fn load(path: &Path, address: Address) -> BlockchainResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BlockchainError::Abi(format!("Cannot read ABI file '{}': {}", path.display(), e))
        })?;
        let abi = parse_abi(&content)?;
        let bindings = Self::from_abi(&abi, address)?;

        tracing::info!(
            contract = %address,
            abi_path = %path.display(),
            count_strategy = bindings.count_strategy_name(),
            "Contract bindings loaded"
        );
        Ok(bindings)
    }

    /// Bind an already parsed ABI.
    pub fn from_abi(abi: &JsonAbi, address: Address) -> BlockchainResult<Self> {
        let submit_article = find_function(abi, SUBMIT_ARTICLE, 2)?;
        let vote_article = find_function(abi, VOTE_ARTICLE, 2)?;
        let get_article = find_function(abi, GET_ARTICLE, 1)?;

        let count = if let Ok(f) = find_function(abi, ARTICLES_LENGTH, 0) {
            ArticleCount::Accessor(f)
        } else if let Some(f) = find_collection_getter(abi) {
            ArticleCount::CollectionLength(f)
        } else {
            return Err(BlockchainError::Abi(format!(
                "ABI exposes neither {}() nor an array-returning {}()",
                ARTICLES_LENGTH, ARTICLES
            )));
        };

        Ok(Self {
            address,
            submit_article,
            vote_article,
            get_article,
            count,
        })
    }

    /// Contract address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Chosen article-count strategy.
    pub fn count_strategy(&self) -> &ArticleCount {
        &self.count
    }

    fn count_strategy_name(&self) -> &'static str {
        match self.count {
            ArticleCount::Accessor(_) => "accessor",
            ArticleCount::CollectionLength(_) => "collection_length",
        }
    }

    /// Calldata for `submitArticle(title, content_hash)`.
    pub fn encode_submit_article(
        &self,
        title: &str,
        content_hash: &str,
    ) -> BlockchainResult<Bytes> {
        encode_call(&self.submit_article, &[title, content_hash])
    }

    /// Calldata for `voteArticle(article_id, upvote)`.
    pub fn encode_vote_article(&self, article_id: u64, upvote: bool) -> BlockchainResult<Bytes> {
        encode_call(
            &self.vote_article,
            &[&article_id.to_string(), if upvote { "true" } else { "false" }],
        )
    }

    /// Calldata for `getArticle(article_id)`.
    pub fn encode_get_article(&self, article_id: u64) -> BlockchainResult<Bytes> {
        encode_call(&self.get_article, &[&article_id.to_string()])
    }

    /// Calldata for the article-count read.
    pub fn encode_count(&self) -> BlockchainResult<Bytes> {
        encode_call(self.count.function(), &[])
    }

    /// Decode the article-count read's return data.
    pub fn decode_count(&self, data: &[u8]) -> BlockchainResult<u64> {
        let values = decode_output(self.count.function(), data)?;
        let first = values
            .into_iter()
            .next()
            .ok_or_else(|| BlockchainError::Decoding("empty count result".to_string()))?;

        match (&self.count, first) {
            (ArticleCount::Accessor(_), value) => uint_to_u64(&value, "article count"),
            (ArticleCount::CollectionLength(_), DynSolValue::Array(items)) => {
                Ok(items.len() as u64)
            }
            (ArticleCount::CollectionLength(_), other) => Err(BlockchainError::Decoding(format!(
                "expected article collection, got {:?}",
                other.as_type()
            ))),
        }
    }

    /// Decode `getArticle` return data into an [`Article`].
    pub fn decode_article(&self, data: &[u8]) -> BlockchainResult<Article> {
        let mut values = decode_output(&self.get_article, data)?;

        // A struct return comes back as one tuple
        if values.len() == 1 {
            if let Some(DynSolValue::Tuple(fields)) = values.pop() {
                values = fields;
            }
        }

        let [title, hash, submitter, upvotes, downvotes, verified]: [DynSolValue; 6] =
            values.try_into().map_err(|v: Vec<DynSolValue>| {
                BlockchainError::Decoding(format!("expected 6 article fields, got {}", v.len()))
            })?;

        Ok(Article {
            title: title
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| field_error("title", &title))?,
            content_hash: value_to_text(&hash).ok_or_else(|| field_error("hash", &hash))?,
            submitter: submitter
                .as_address()
                .ok_or_else(|| field_error("submitter", &submitter))?,
            upvotes: uint_to_u64(&upvotes, "upvotes")?,
            downvotes: uint_to_u64(&downvotes, "downvotes")?,
            verified: verified
                .as_bool()
                .ok_or_else(|| field_error("verified", &verified))?,
        })
    }
}

/// Parse ABI JSON, either a bare array or `{"abi": [...]}`.
pub fn parse_abi(content: &str) -> BlockchainResult<JsonAbi> {
    if let Ok(abi) = serde_json::from_str::<JsonAbi>(content) {
        return Ok(abi);
    }

    let artifact: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| BlockchainError::Abi(format!("Invalid ABI JSON: {}", e)))?;
    let abi = artifact
        .get("abi")
        .ok_or_else(|| BlockchainError::Abi("ABI JSON has no function list".to_string()))?;
    serde_json::from_value(abi.clone())
        .map_err(|e| BlockchainError::Abi(format!("Invalid ABI JSON: {}", e)))
}

fn find_function(abi: &JsonAbi, name: &str, arity: usize) -> BlockchainResult<Function> {
    abi.function(name)
        .and_then(|overloads| overloads.iter().find(|f| f.inputs.len() == arity))
        .cloned()
        .ok_or_else(|| {
            BlockchainError::Abi(format!(
                "ABI is missing {}() with {} argument(s)",
                name, arity
            ))
        })
}

fn find_collection_getter(abi: &JsonAbi) -> Option<Function> {
    abi.function(ARTICLES)?
        .iter()
        .find(|f| {
            f.inputs.is_empty()
                && f.outputs.len() == 1
                && matches!(
                    f.outputs[0].resolve(),
                    Ok(DynSolType::Array(_)) | Ok(DynSolType::FixedArray(..))
                )
        })
        .cloned()
}

/// Coerce each textual argument into its ABI parameter type and encode.
fn encode_call(function: &Function, args: &[&str]) -> BlockchainResult<Bytes> {
    let values = function
        .inputs
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let ty = param.resolve().map_err(|e| {
                BlockchainError::Abi(format!("{}: bad parameter type: {}", function.name, e))
            })?;
            ty.coerce_str(arg).map_err(|e| {
                BlockchainError::Encoding(format!(
                    "{}: cannot encode '{}' as {}: {}",
                    function.name, arg, param.ty, e
                ))
            })
        })
        .collect::<BlockchainResult<Vec<_>>>()?;

    function
        .abi_encode_input(&values)
        .map(Bytes::from)
        .map_err(|e| BlockchainError::Encoding(format!("{}: {}", function.name, e)))
}

fn decode_output(function: &Function, data: &[u8]) -> BlockchainResult<Vec<DynSolValue>> {
    function
        .abi_decode_output(data)
        .map_err(|e| BlockchainError::Decoding(format!("{}: {}", function.name, e)))
}

fn uint_to_u64(value: &DynSolValue, what: &str) -> BlockchainResult<u64> {
    let (n, _) = value.as_uint().ok_or_else(|| field_error(what, value))?;
    u64::try_from(n).map_err(|_| {
        BlockchainError::Decoding(format!("{} does not fit in 64 bits: {}", what, n))
    })
}

fn value_to_text(value: &DynSolValue) -> Option<String> {
    match value {
        DynSolValue::String(s) => Some(s.clone()),
        DynSolValue::FixedBytes(word, size) => Some(hex::encode_prefixed(&word[..*size])),
        DynSolValue::Bytes(bytes) => Some(hex::encode_prefixed(bytes)),
        _ => None,
    }
}

fn field_error(field: &str, value: &DynSolValue) -> BlockchainError {
    BlockchainError::Decoding(format!(
        "unexpected type for article {}: {:?}",
        field,
        value.as_type()
    ))
}
