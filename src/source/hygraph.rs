//! GraphQL client for the hosted content API (Hygraph).
//!
//! Every call is a `POST {query, variables}` with a bearer token. A response only
//! counts as successful when the HTTP status is 2xx, the `errors` array is empty
//! and `data` is present.

use super::{CatalogSource, SourceProduct, SourceSale};
use crate::config::settings::SourceSettings;
use crate::errors::{Error, Result};
use crate::migration::replicate::{ProductCopy, ProductSink};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, error, instrument};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const BODY_PREVIEW_CHARS: usize = 500;

/// Products page, alphabetical
pub const PRODUCTS_QUERY: &str = r"
  query GetAllProducts($first: Int!, $skip: Int!) {
    products(orderBy: name_ASC, first: $first, skip: $skip) {
      id
      name
      price
      slug
      category
    }
  }
";

/// Sales page, newest first, with sold items and their product summary
pub const SALES_QUERY: &str = r"
  query GetAllSales($first: Int!, $skip: Int!) {
    sales(orderBy: time_DESC, first: $first, skip: $skip) {
      id
      sum
      paymentMethod
      time
      fullfilled
      text
      soldItems {
        id
        price
        product {
          id
          name
          category
        }
      }
    }
  }
";

/// Creates one product in a project
pub const CREATE_PRODUCT_MUTATION: &str = r"
  mutation CreateProduct($data: ProductCreateInput!) {
    createProduct(data: $data) {
      id
      name
      price
      slug
      category
    }
  }
";

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ProductsPage {
    products: Vec<SourceProduct>,
}

#[derive(Debug, Deserialize)]
struct SalesPage {
    sales: Vec<SourceSale>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedProduct {
    create_product: SourceProduct,
}

/// HTTP client bound to one content API project.
pub struct HygraphClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl std::fmt::Debug for HygraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HygraphClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl HygraphClient {
    /// Builds a client for the given endpoint and token.
    ///
    /// # Errors
    /// Returns [`Error::Http`] if the TLS backend cannot be initialised.
    pub fn new(settings: &SourceSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            endpoint: settings.endpoint.clone(),
            token: settings.token.clone(),
        })
    }

    /// Builds a client from `<PREFIX>_ENDPOINT` and `<PREFIX>_TOKEN`.
    pub fn from_env(prefix: &str) -> Result<Self> {
        Self::new(&SourceSettings::from_env(prefix)?)
    }

    /// Sends one GraphQL operation and decodes its `data` into `T`.
    #[instrument(skip(self, query, variables), fields(endpoint = %self.endpoint))]
    pub async fn request<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("Response status: {status}, body: {}", preview(&body));

        if !status.is_success() {
            error!("Content API request failed with status {status}");
            return Err(Error::Source {
                message: format!("request failed with status {status}: {}", preview(&body)),
            });
        }

        decode_response(&body)
    }
}

/// Extracts `data` from a GraphQL response body.
fn decode_response<T: DeserializeOwned>(body: &str) -> Result<T> {
    let response: GraphQlResponse<T> = serde_json::from_str(body)?;

    if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
        let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
        return Err(Error::Source {
            message: messages.join("; "),
        });
    }

    response.data.ok_or_else(|| Error::Source {
        message: "response contained no data".to_string(),
    })
}

fn preview(body: &str) -> String {
    let mut preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
    if preview.len() < body.len() {
        preview.push_str("...");
    }
    preview
}

#[async_trait]
impl CatalogSource for HygraphClient {
    async fn product_page(&self, first: u32, skip: u32) -> Result<Vec<SourceProduct>> {
        let page: ProductsPage = self
            .request(PRODUCTS_QUERY, json!({ "first": first, "skip": skip }))
            .await?;
        Ok(page.products)
    }

    async fn sale_page(&self, first: u32, skip: u32) -> Result<Vec<SourceSale>> {
        let page: SalesPage = self
            .request(SALES_QUERY, json!({ "first": first, "skip": skip }))
            .await?;
        Ok(page.sales)
    }
}

#[async_trait]
impl ProductSink for HygraphClient {
    async fn create_product(&self, product: &ProductCopy) -> Result<Option<String>> {
        let created: CreatedProduct = self
            .request(
                CREATE_PRODUCT_MUTATION,
                json!({
                    "data": {
                        "name": product.name,
                        "price": product.price,
                        "slug": product.slug,
                        "category": product.category,
                    }
                }),
            )
            .await?;
        Ok(created.create_product.id)
    }
}
