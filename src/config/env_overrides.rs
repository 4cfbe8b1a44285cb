use super::Config;

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

impl Config {
    pub fn apply_env_overrides(&mut self) {
        // ── Storage ──
        if let Some(uri) = non_empty_var("CLAIMSIGHT_DATABASE_URI") {
            self.storage.uri = Some(uri);
        }
        if let Some(database) = non_empty_var("CLAIMSIGHT_DATABASE_NAME") {
            self.storage.database = Some(database);
        }
        if let Some(collection) = non_empty_var("CLAIMSIGHT_POLICY_COLLECTION") {
            self.storage.policy_collection = Some(collection);
        }
        if let Some(collection) = non_empty_var("CLAIMSIGHT_RECOMMENDATION_COLLECTION") {
            self.storage.recommendation_collection = Some(collection);
        }
        if let Some(collection) = non_empty_var("CLAIMSIGHT_HISTORY_COLLECTION") {
            self.storage.history_collection = Some(collection);
        }
        if let Some(index) = non_empty_var("CLAIMSIGHT_VECTOR_INDEX") {
            self.storage.vector_index = Some(index);
        }

        // ── LLM ──
        if let Some(key) =
            non_empty_var("CLAIMSIGHT_API_KEY").or_else(|| non_empty_var("ANTHROPIC_API_KEY"))
        {
            self.llm.api_key = Some(key);
        }
        if let Some(base_url) = non_empty_var("CLAIMSIGHT_LLM_BASE_URL") {
            self.llm.base_url = Some(base_url);
        }
        if let Some(model) = non_empty_var("CLAIMSIGHT_AGENT_MODEL") {
            self.llm.agent_model = model;
        }
        if let Some(model) = non_empty_var("CLAIMSIGHT_VISION_MODEL") {
            self.llm.vision_model = model;
        }
        if let Some(temp_str) = non_empty_var("CLAIMSIGHT_TEMPERATURE")
            && let Ok(temp) = temp_str.parse::<f64>()
            && (0.0..=1.0).contains(&temp)
        {
            self.llm.temperature = temp;
        }

        // ── Embeddings ──
        if let Some(base_url) = non_empty_var("CLAIMSIGHT_EMBEDDING_BASE_URL") {
            self.embedding.base_url = base_url;
        }
        if let Some(key) = non_empty_var("CLAIMSIGHT_EMBEDDING_API_KEY") {
            self.embedding.api_key = Some(key);
        }
        if let Some(model) = non_empty_var("CLAIMSIGHT_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Some(dims_str) = non_empty_var("CLAIMSIGHT_EMBEDDING_DIMENSIONS")
            && let Ok(dims) = dims_str.parse::<usize>()
            && dims > 0
        {
            self.embedding.dimensions = dims;
        }

        // ── Gateway ──
        if let Some(host) =
            non_empty_var("CLAIMSIGHT_GATEWAY_HOST").or_else(|| non_empty_var("HOST"))
        {
            self.gateway.host = host;
        }
        if let Some(port_str) =
            non_empty_var("CLAIMSIGHT_GATEWAY_PORT").or_else(|| non_empty_var("PORT"))
            && let Ok(port) = port_str.parse::<u16>()
        {
            self.gateway.port = port;
        }
        if let Some(limit_str) = non_empty_var("CLAIMSIGHT_MAX_UPLOAD_BYTES")
            && let Ok(limit) = limit_str.parse::<usize>()
        {
            self.gateway.max_upload_bytes = limit;
        }
    }
}
