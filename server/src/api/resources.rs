//! List endpoint definitions
//!
//! Tables, filter registries, sort orders and field allow-lists for every
//! list endpoint. Built once at startup; any misconfiguration here fails
//! server start rather than a request.

use crate::core::config::QueryConfig;
use crate::query::{
    CountStrategy, CursorCodec, EndpointQuery, FieldSelectionConfig, FieldType, FilterRegistry,
    Operator, PaginationConfig, RegistryError, SortConfig, SortDirection, TableDef,
};

use Operator as Op;

const RANGE: &[Operator] = &[Op::Eq, Op::Gt, Op::Gte, Op::Lt, Op::Lte];
const DATE_RANGE: &[Operator] = &[Op::Gt, Op::Gte, Op::Lt, Op::Lte];

/// Every list endpoint the API serves
#[derive(Debug, Clone)]
pub struct Resources {
    pub products: EndpointQuery,
    pub posts: EndpointQuery,
    pub my_posts: EndpointQuery,
}

impl Resources {
    pub fn new(config: &QueryConfig, cursor_key: &[u8]) -> Result<Self, RegistryError> {
        let pagination =
            PaginationConfig::new(config.default_limit, config.max_limit, config.max_offset)?;
        let codec = CursorCodec::new(cursor_key.to_vec(), config.cursor_ttl_secs);

        Ok(Self {
            products: products(config, pagination.clone(), codec.scoped("products"))?,
            posts: posts(config, pagination.clone(), codec.scoped("posts"))?,
            my_posts: my_posts(config, pagination, codec.scoped("me/posts"))?,
        })
    }
}

fn products_table() -> Result<TableDef, RegistryError> {
    TableDef::builder("products")
        .column("id", FieldType::Integer)
        .column("seller_id", FieldType::String)
        .column("name", FieldType::String)
        .column("category", FieldType::String)
        .column("price", FieldType::Number)
        .column("stock", FieldType::Integer)
        .column("is_active", FieldType::Boolean)
        .nullable("rating", FieldType::Number)
        .column("created_at", FieldType::Date)
        .build()
}

fn posts_table() -> Result<TableDef, RegistryError> {
    TableDef::builder("posts")
        .column("id", FieldType::Integer)
        .column("author_id", FieldType::String)
        .column("body", FieldType::String)
        .column("visibility", FieldType::String)
        .column("like_count", FieldType::Integer)
        .column("created_at", FieldType::Date)
        .nullable("edited_at", FieldType::Date)
        .build()
}

/// Public catalog; `is_active` is enforced by the route and never exposed
fn products(
    config: &QueryConfig,
    pagination: PaginationConfig,
    codec: CursorCodec,
) -> Result<EndpointQuery, RegistryError> {
    let table = products_table()?;
    let filters = FilterRegistry::new(
        &table,
        &[
            ("name", &[Op::Eq, Op::Contains, Op::StartsWith]),
            ("category", &[Op::Eq, Op::Ne, Op::In, Op::Nin]),
            ("seller_id", &[Op::Eq, Op::In]),
            ("price", RANGE),
            ("stock", RANGE),
            ("rating", &[Op::Gte, Op::Lte, Op::Null]),
            ("created_at", DATE_RANGE),
        ],
        config.max_filters,
    )?;
    let sorts = SortConfig::new(
        &table,
        &["price", "created_at", "rating", "name", "stock"],
        &[("created_at", SortDirection::Desc)],
        "id",
        config.max_sorts,
    )?;
    let fields = FieldSelectionConfig::allowed(
        &table,
        &[
            "id",
            "name",
            "category",
            "price",
            "stock",
            "rating",
            "seller_id",
            "created_at",
        ],
    )?;
    EndpointQuery::new(table, filters, sorts, pagination, fields, codec)
}

const POST_FILTERS: &[(&str, &[Operator])] = &[
    ("author_id", &[Op::Eq, Op::In]),
    ("body", &[Op::Contains]),
    ("like_count", RANGE),
    ("created_at", DATE_RANGE),
    ("edited_at", &[Op::Gte, Op::Lte, Op::Null]),
];

const POST_SORTS: &[&str] = &["created_at", "like_count", "edited_at"];

const POST_FIELDS: &[&str] = &[
    "id",
    "author_id",
    "body",
    "like_count",
    "created_at",
    "edited_at",
];

/// Public feed, newest first
fn posts(
    config: &QueryConfig,
    pagination: PaginationConfig,
    codec: CursorCodec,
) -> Result<EndpointQuery, RegistryError> {
    let table = posts_table()?;
    let filters = FilterRegistry::new(&table, POST_FILTERS, config.max_filters)?;
    let sorts = SortConfig::new(
        &table,
        POST_SORTS,
        &[("created_at", SortDirection::Desc)],
        "id",
        config.max_sorts,
    )?;
    let fields = FieldSelectionConfig::allowed(&table, POST_FIELDS)?;
    EndpointQuery::new(table, filters, sorts, pagination, fields, codec)
}

/// The caller's own posts, including non-public ones, with totals
fn my_posts(
    config: &QueryConfig,
    pagination: PaginationConfig,
    codec: CursorCodec,
) -> Result<EndpointQuery, RegistryError> {
    let table = posts_table()?;
    let mut filter_fields = POST_FILTERS.to_vec();
    filter_fields.push(("visibility", &[Op::Eq, Op::Ne, Op::In]));
    let filters = FilterRegistry::new(&table, &filter_fields, config.max_filters)?;
    let sorts = SortConfig::new(
        &table,
        POST_SORTS,
        &[("created_at", SortDirection::Desc)],
        "id",
        config.max_sorts,
    )?;
    let mut field_names = POST_FIELDS.to_vec();
    field_names.push("visibility");
    let fields = FieldSelectionConfig::allowed(&table, &field_names)?;
    Ok(EndpointQuery::new(table, filters, sorts, pagination, fields, codec)?
        .with_count(CountStrategy::Exact))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::{
        DEFAULT_CURSOR_TTL_SECS, DEFAULT_LIMIT, MAX_FILTERS, MAX_LIMIT, MAX_OFFSET, MAX_SORTS,
        QUERY_TIMEOUT_SECS,
    };

    fn query_config() -> QueryConfig {
        QueryConfig {
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
            max_filters: MAX_FILTERS,
            max_sorts: MAX_SORTS,
            max_offset: MAX_OFFSET,
            cursor_ttl_secs: DEFAULT_CURSOR_TTL_SECS,
            timeout_secs: QUERY_TIMEOUT_SECS,
        }
    }

    #[test]
    fn all_endpoints_register() {
        let resources = Resources::new(&query_config(), &[1u8; 32]).unwrap();
        assert_eq!(resources.products.table().name(), "products");
        assert_eq!(resources.posts.table().name(), "posts");
        assert_eq!(resources.my_posts.table().name(), "posts");
    }

    #[test]
    fn rejects_default_limit_above_max() {
        let mut config = query_config();
        config.default_limit = config.max_limit + 1;
        assert!(Resources::new(&config, &[1u8; 32]).is_err());
    }

    #[test]
    fn hidden_columns_cannot_be_filtered_or_selected() {
        let resources = Resources::new(&query_config(), &[1u8; 32]).unwrap();
        let params = crate::query::QueryParams::from_pairs([("filter[is_active]", "false")]).unwrap();
        assert!(matches!(
            resources.products.build_spec(&params),
            Err(crate::query::QueryError::UnknownFilterField { .. })
        ));

        let params = crate::query::QueryParams::from_pairs([("fields", "visibility")]).unwrap();
        assert!(resources.posts.build_spec(&params).is_err());
        assert!(resources.my_posts.build_spec(&params).is_ok());
    }
}
