use actix_web::web;

pub mod admin;
pub mod auth;
pub mod entities;
pub mod health;
pub mod search;
pub mod tasks;
pub mod vectorize;

/// Register every route
///
/// Search routes go before the `{id}` routes of the same prefix.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health::root)
        .service(health::health)
        .service(entities::list_users)
        .service(entities::list_businesses)
        .service(entities::list_categories)
        .service(entities::get_category)
        .service(search::search_branches)
        .service(entities::list_branches)
        .service(entities::get_branch)
        .service(search::search_products)
        .service(entities::list_products)
        .service(entities::get_product)
        .service(vectorize::vectorize)
        .service(admin::create_collection)
        .service(admin::test_embedding)
        .service(auth::register)
        .service(auth::login)
        .service(tasks::get_tasks)
        .service(tasks::get_task);
}

#[cfg(test)]
pub(crate) mod test_support {
    use llego_store::MemoryStore;
    use llego_vector::testing::FakeEmbedder;
    use llego_vector::{MemoryIndex, SearchThresholds};
    use secrecy::Secret;
    use serde_json::json;
    use std::sync::Arc;

    use crate::auth::JwtIssuer;
    use crate::state::AppState;

    pub struct TestContext {
        pub state: Arc<AppState>,
        pub store: Arc<MemoryStore>,
        pub index: Arc<MemoryIndex>,
        pub embedder: Arc<FakeEmbedder>,
    }

    /// Two branches and three products; "pan" embeds next to product p1
    pub async fn context() -> TestContext {
        let store = Arc::new(MemoryStore::new());
        for (id, name, address) in [("b1", "Centro", "Obispo 101"), ("b2", "Vedado", "Calle 23")] {
            store
                .put(
                    "branches",
                    json!({
                        "_id": id,
                        "businessId": "biz1",
                        "name": name,
                        "address": address,
                        "coordinates": {"type": "Point", "coordinates": [-82.35, 23.14]},
                        "createdAt": "2024-03-01T10:00:00Z"
                    }),
                )
                .await
                .unwrap();
        }
        for (id, name, branch, category, available) in [
            ("p1", "Pan de gloria", "b1", "c1", true),
            ("p2", "Pastel de guayaba", "b1", "c1", false),
            ("p3", "Batido de mamey", "b2", "c2", true),
        ] {
            store
                .put(
                    "products",
                    json!({
                        "_id": id,
                        "branchId": branch,
                        "categoryId": category,
                        "name": name,
                        "description": format!("{} casero", name),
                        "price": 2.5,
                        "availability": available,
                        "createdAt": "2024-03-01T10:00:00Z"
                    }),
                )
                .await
                .unwrap();
        }
        store
            .put(
                "businesses",
                json!({
                    "_id": "biz1",
                    "name": "La Bodeguita",
                    "type": "restaurant",
                    "ownerId": "u1",
                    "createdAt": "2024-03-01T10:00:00Z"
                }),
            )
            .await
            .unwrap();
        store
            .put(
                "categories",
                json!({
                    "_id": "c1",
                    "name": "Dulces",
                    "subcategories": [{"name": "Pasteles"}],
                    "createdAt": "2024-03-01T10:00:00Z"
                }),
            )
            .await
            .unwrap();

        let embedder = Arc::new(
            FakeEmbedder::new(2)
                .with_vector("Pan de gloria", vec![1.0, 0.0])
                .with_vector("Pastel de guayaba", vec![0.8, 0.6])
                .with_vector("Batido de mamey", vec![0.0, 1.0])
                .with_vector("pan", vec![1.0, 0.0]),
        );
        let index = Arc::new(MemoryIndex::new());

        let state = Arc::new(AppState::new(
            store.clone(),
            embedder.clone(),
            index.clone(),
            SearchThresholds::default(),
            JwtIssuer::new(Secret::new("test-secret".to_string()), 60),
        ));

        TestContext {
            state,
            store,
            index,
            embedder,
        }
    }
}
