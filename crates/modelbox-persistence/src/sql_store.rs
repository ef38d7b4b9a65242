//! A `MetadataStore` built on a pooled, synchronous Diesel connection.
//! Diesel's query DSL is already backend-portable (bind style and
//! parameter numbering are handled per-`Backend`); the one place the
//! three dialects genuinely diverge is the metadata upsert and
//! duplicate-key detection, both routed through `QueryRegistry`.
//!
//! Diesel connections are `!Send` across `.await` points, so every method
//! below borrows a connection from the `r2d2` pool and runs its query
//! inside `spawn_blocking`. The body is identical for every backend; only
//! the connection type and `QueryRegistry` impl differ, so it is written
//! once here and instantiated per backend by `impl_sql_metadata_store!`.

#[allow(unused_imports)]
use diesel::prelude::*;
#[allow(unused_imports)]
use crate::query_registry::QueryRegistry;

/// Expands to a `MetadataStore` impl for one concrete Diesel connection
/// type. `$store` names the generated struct, `$conn` the Diesel
/// connection type, `$registry` the concrete `QueryRegistry`.
macro_rules! impl_sql_metadata_store {
    ($store:ident, $conn:ty, $registry:ty, $create_schema:path) => {
        /// Upserts a batch of metadata rows through the registry's
        /// dialect-specific `ON CONFLICT`/`ON DUPLICATE KEY` SQL; shared by
        /// every `create_*`/`update_metadata` body in this backend.
        fn upsert_metadata_rows(
            conn: &mut $conn,
            registry: &$registry,
            rows: &[crate::rows::MetadataRowSql],
        ) -> Result<(), diesel::result::Error> {
            use diesel::sql_types::Text;
            use diesel::RunQueryDsl;
            for row in rows {
                diesel::sql_query(registry.upsert_metadata_sql())
                    .bind::<Text, _>(row.id.clone())
                    .bind::<Text, _>(row.parent_id.clone())
                    .bind::<Text, _>(row.key.clone())
                    .bind::<Text, _>(row.value.clone())
                    .execute(conn)?;
            }
            Ok(())
        }

        /// Inserts File rows one at a time, mapping a duplicate-key
        /// collision into success (the upload path's `duplicate-file`
        /// outcome, not an error).
        fn insert_files(
            conn: &mut $conn,
            registry: &$registry,
            rows: &[crate::rows::BlobRow],
        ) -> Result<(), diesel::result::Error> {
            use crate::schema::blobs::dsl;
            use diesel::RunQueryDsl;
            for row in rows {
                let inserted = diesel::insert_into(dsl::blobs).values(row).execute(conn);
                match inserted {
                    Ok(_) => {}
                    Err(e) if registry.is_duplicate(&e) => {}
                    Err(e) => return Err(e),
                }
            }
            Ok(())
        }

        /// Appends one row to the mutation log. `mutation_id` is assigned
        /// by the database (autoincrement PK); the draft `ChangeEvent`
        /// passed in always carries `0` for it.
        fn insert_mutation_event(
            conn: &mut $conn,
            change: &modelbox_domain::change_event::ChangeEvent,
        ) -> Result<(), diesel::result::Error> {
            use crate::schema::mutation_events::dsl;
            use diesel::RunQueryDsl;
            let mut insert = crate::rows::MutationEventInsert::from_change_event(change);
            insert.mutation_time = modelbox_core::now_epoch() as i64;
            diesel::insert_into(dsl::mutation_events)
                .values(&insert)
                .execute(conn)?;
            Ok(())
        }

        pub struct $store {
            pool: diesel::r2d2::Pool<diesel::r2d2::ConnectionManager<$conn>>,
            registry: $registry,
        }

        impl $store {
            pub fn new(pool: diesel::r2d2::Pool<diesel::r2d2::ConnectionManager<$conn>>) -> Self {
                Self { pool, registry: <$registry>::default() }
            }

            async fn run<F, T>(&self, f: F) -> modelbox_core::ModelBoxResult<T>
            where
                F: FnOnce(&mut $conn) -> Result<T, diesel::result::Error> + Send + 'static,
                T: Send + 'static,
            {
                let pool = self.pool.clone();
                let joined = tokio::task::spawn_blocking(move || {
                    let mut conn = pool
                        .get()
                        .map_err(|e| crate::error::PersistenceError::TransientIo(e.to_string()))?;
                    f(&mut conn).map_err(crate::error::PersistenceError::from)
                })
                .await
                .map_err(|e| {
                    modelbox_core::ModelBoxError::StorageUnavailable(format!(
                        "blocking task panicked: {e}"
                    ))
                })?;
                joined.map_err(modelbox_core::ModelBoxError::from)
            }
        }

        #[async_trait::async_trait]
        impl modelbox_core::MetadataStore for $store {
            async fn ping(&self) -> modelbox_core::ModelBoxResult<()> {
                use diesel::RunQueryDsl;
                self.run(|conn| diesel::sql_query("SELECT 1").execute(conn).map(|_| ()))
                    .await
            }

            async fn create_schema(&self) -> modelbox_core::ModelBoxResult<()> {
                self.run(|conn| {
                    $create_schema(conn).map_err(|e| {
                        diesel::result::Error::QueryBuilderError(e.into())
                    })
                })
                .await
            }

            fn backend(&self) -> &'static str {
                self.registry.dialect()
            }

            async fn close(&self) -> modelbox_core::ModelBoxResult<()> {
                Ok(())
            }

            async fn create_experiment(
                &self,
                experiment: modelbox_domain::Experiment,
                meta: modelbox_domain::MetadataMap,
            ) -> modelbox_core::ModelBoxResult<modelbox_core::CreateResult> {
                use crate::schema::experiments::dsl;
                use diesel::RunQueryDsl;
                let row = crate::rows::ExperimentRow::from(&experiment);
                let id = experiment.id.clone();
                let meta_rows: Vec<crate::rows::MetadataRowSql> = meta
                    .into_iter()
                    .map(|(k, v)| {
                        (&modelbox_domain::MetadataRow::new(id.clone(), k, v)).into()
                    })
                    .collect();
                let registry_dup = self.registry.clone();
                let change = modelbox_domain::change_event::ChangeEvent::draft(
                    modelbox_domain::EventType::ExperimentCreated,
                    id.clone(),
                    modelbox_domain::ObjectType::Experiment,
                    id.clone(),
                    experiment.namespace.clone(),
                    None,
                );
                self.run(move |conn| {
                    conn.transaction(|conn| {
                        let inserted = diesel::insert_into(dsl::experiments)
                            .values(&row)
                            .execute(conn);
                        match inserted {
                            Ok(_) => {
                                upsert_metadata_rows(conn, &registry_dup, &meta_rows)?;
                                insert_mutation_event(conn, &change)?;
                                Ok(modelbox_core::CreateResult::created(id.clone()))
                            }
                            Err(e) if registry_dup.is_duplicate(&e) => {
                                Ok(modelbox_core::CreateResult::existing(id.clone()))
                            }
                            Err(e) => Err(e),
                        }
                    })
                })
                .await
            }

            async fn get_experiment(
                &self,
                id: &str,
            ) -> modelbox_core::ModelBoxResult<modelbox_domain::Experiment> {
                use crate::schema::experiments::dsl;
                use diesel::RunQueryDsl;
                let id = id.to_string();
                self.run(move |conn| {
                    dsl::experiments
                        .filter(dsl::id.eq(&id))
                        .first::<crate::rows::ExperimentRow>(conn)
                        .map(Into::into)
                })
                .await
            }

            async fn list_experiments(
                &self,
                namespace: &str,
            ) -> modelbox_core::ModelBoxResult<Vec<modelbox_domain::Experiment>> {
                use crate::schema::experiments::dsl;
                use diesel::RunQueryDsl;
                let namespace = namespace.to_string();
                self.run(move |conn| {
                    dsl::experiments
                        .filter(dsl::namespace.eq(&namespace))
                        .order(dsl::created_at.asc())
                        .load::<crate::rows::ExperimentRow>(conn)
                        .map(|rows| rows.into_iter().map(Into::into).collect())
                })
                .await
            }

            /// Maintenance-only no-op; see the trait doc comment.
            async fn delete_experiment(&self, _id: &str) -> modelbox_core::ModelBoxResult<()> {
                Ok(())
            }

            async fn create_checkpoint(
                &self,
                checkpoint: modelbox_domain::Checkpoint,
                files: Vec<modelbox_domain::File>,
            ) -> modelbox_core::ModelBoxResult<modelbox_core::CreateResult> {
                use crate::schema::checkpoints::dsl as cdsl;
                use diesel::RunQueryDsl;
                let row = crate::rows::CheckpointRow::from(&checkpoint);
                let id = checkpoint.id.clone();
                let file_rows: Vec<crate::rows::BlobRow> =
                    files.iter().map(crate::rows::BlobRow::from).collect();
                let registry_dup = self.registry.clone();
                let change = modelbox_domain::change_event::ChangeEvent::draft(
                    modelbox_domain::EventType::ActionCreated,
                    id.clone(),
                    modelbox_domain::ObjectType::Experiment,
                    checkpoint.experiment_id.clone(),
                    String::new(),
                    None,
                );
                let _ = &change; // checkpoints are not a trigger source; no event logged
                self.run(move |conn| {
                    conn.transaction(|conn| {
                        let inserted = diesel::insert_into(cdsl::checkpoints)
                            .values(&row)
                            .execute(conn);
                        match inserted {
                            Ok(_) => {
                                insert_files(conn, &registry_dup, &file_rows)?;
                                Ok(modelbox_core::CreateResult::created(id.clone()))
                            }
                            Err(e) if registry_dup.is_duplicate(&e) => {
                                Ok(modelbox_core::CreateResult::existing(id.clone()))
                            }
                            Err(e) => Err(e),
                        }
                    })
                })
                .await
            }

            async fn list_checkpoints(
                &self,
                experiment_id: &str,
            ) -> modelbox_core::ModelBoxResult<Vec<modelbox_domain::Checkpoint>> {
                use crate::schema::checkpoints::dsl;
                use diesel::RunQueryDsl;
                let experiment_id = experiment_id.to_string();
                self.run(move |conn| {
                    dsl::checkpoints
                        .filter(dsl::experiment_id.eq(&experiment_id))
                        .order(dsl::epoch.asc())
                        .load::<crate::rows::CheckpointRow>(conn)
                        .map(|rows| rows.into_iter().map(Into::into).collect())
                })
                .await
            }

            async fn get_checkpoint(
                &self,
                id: &str,
            ) -> modelbox_core::ModelBoxResult<(modelbox_domain::Checkpoint, Vec<modelbox_domain::File>)>
            {
                use crate::schema::blobs::dsl as bdsl;
                use crate::schema::checkpoints::dsl as cdsl;
                use diesel::RunQueryDsl;
                let id = id.to_string();
                self.run(move |conn| {
                    let checkpoint = cdsl::checkpoints
                        .filter(cdsl::id.eq(&id))
                        .first::<crate::rows::CheckpointRow>(conn)?;
                    let files = bdsl::blobs
                        .filter(bdsl::parent_id.eq(&id))
                        .load::<crate::rows::BlobRow>(conn)?;
                    Ok((checkpoint.into(), files.into_iter().map(Into::into).collect()))
                })
                .await
            }

            async fn create_model(
                &self,
                model: modelbox_domain::Model,
                meta: modelbox_domain::MetadataMap,
            ) -> modelbox_core::ModelBoxResult<modelbox_core::CreateResult> {
                use crate::schema::models::dsl;
                use diesel::RunQueryDsl;
                let row = crate::rows::ModelRow::from(&model);
                let id = model.id.clone();
                let meta_rows: Vec<crate::rows::MetadataRowSql> = meta
                    .into_iter()
                    .map(|(k, v)| (&modelbox_domain::MetadataRow::new(id.clone(), k, v)).into())
                    .collect();
                let registry_dup = self.registry.clone();
                let change = modelbox_domain::change_event::ChangeEvent::draft(
                    modelbox_domain::EventType::ModelCreated,
                    id.clone(),
                    modelbox_domain::ObjectType::Model,
                    id.clone(),
                    model.namespace.clone(),
                    None,
                );
                self.run(move |conn| {
                    conn.transaction(|conn| {
                        let inserted = diesel::insert_into(dsl::models).values(&row).execute(conn);
                        match inserted {
                            Ok(_) => {
                                upsert_metadata_rows(conn, &registry_dup, &meta_rows)?;
                                insert_mutation_event(conn, &change)?;
                                Ok(modelbox_core::CreateResult::created(id.clone()))
                            }
                            Err(e) if registry_dup.is_duplicate(&e) => {
                                Ok(modelbox_core::CreateResult::existing(id.clone()))
                            }
                            Err(e) => Err(e),
                        }
                    })
                })
                .await
            }

            async fn get_model(
                &self,
                id: &str,
            ) -> modelbox_core::ModelBoxResult<modelbox_domain::Model> {
                use crate::schema::models::dsl;
                use diesel::RunQueryDsl;
                let id = id.to_string();
                self.run(move |conn| {
                    dsl::models
                        .filter(dsl::id.eq(&id))
                        .first::<crate::rows::ModelRow>(conn)
                        .map(Into::into)
                })
                .await
            }

            async fn list_models(
                &self,
                namespace: &str,
            ) -> modelbox_core::ModelBoxResult<Vec<modelbox_domain::Model>> {
                use crate::schema::models::dsl;
                use diesel::RunQueryDsl;
                let namespace = namespace.to_string();
                self.run(move |conn| {
                    dsl::models
                        .filter(dsl::namespace.eq(&namespace))
                        .order(dsl::created_at.asc())
                        .load::<crate::rows::ModelRow>(conn)
                        .map(|rows| rows.into_iter().map(Into::into).collect())
                })
                .await
            }

            async fn create_model_version(
                &self,
                version: modelbox_domain::ModelVersion,
                meta: modelbox_domain::MetadataMap,
                files: Vec<modelbox_domain::File>,
            ) -> modelbox_core::ModelBoxResult<modelbox_core::CreateResult> {
                use crate::schema::model_versions::dsl;
                use diesel::RunQueryDsl;
                let row = crate::rows::ModelVersionRow::from(&version);
                let id = version.id.clone();
                let meta_rows: Vec<crate::rows::MetadataRowSql> = meta
                    .into_iter()
                    .map(|(k, v)| (&modelbox_domain::MetadataRow::new(id.clone(), k, v)).into())
                    .collect();
                let file_rows: Vec<crate::rows::BlobRow> =
                    files.iter().map(crate::rows::BlobRow::from).collect();
                let registry_dup = self.registry.clone();
                let model_id = version.model_id.clone();
                self.run(move |conn| {
                    conn.transaction(|conn| {
                        use crate::schema::models::dsl as mdsl;
                        let namespace: String = mdsl::models
                            .filter(mdsl::id.eq(&model_id))
                            .select(mdsl::namespace)
                            .first(conn)?;
                        let change = modelbox_domain::change_event::ChangeEvent::draft(
                            modelbox_domain::EventType::ModelVersionCreated,
                            id.clone(),
                            modelbox_domain::ObjectType::ModelVersion,
                            model_id.clone(),
                            namespace,
                            None,
                        );
                        let inserted =
                            diesel::insert_into(dsl::model_versions).values(&row).execute(conn);
                        match inserted {
                            Ok(_) => {
                                upsert_metadata_rows(conn, &registry_dup, &meta_rows)?;
                                insert_files(conn, &registry_dup, &file_rows)?;
                                insert_mutation_event(conn, &change)?;
                                Ok(modelbox_core::CreateResult::created(id.clone()))
                            }
                            Err(e) if registry_dup.is_duplicate(&e) => {
                                Ok(modelbox_core::CreateResult::existing(id.clone()))
                            }
                            Err(e) => Err(e),
                        }
                    })
                })
                .await
            }

            async fn get_model_version(
                &self,
                id: &str,
            ) -> modelbox_core::ModelBoxResult<modelbox_domain::ModelVersion> {
                use crate::schema::model_versions::dsl;
                use diesel::RunQueryDsl;
                let id = id.to_string();
                self.run(move |conn| {
                    dsl::model_versions
                        .filter(dsl::id.eq(&id))
                        .first::<crate::rows::ModelVersionRow>(conn)
                        .map(Into::into)
                })
                .await
            }

            async fn list_model_versions(
                &self,
                model_id: &str,
            ) -> modelbox_core::ModelBoxResult<Vec<modelbox_domain::ModelVersion>> {
                use crate::schema::model_versions::dsl;
                use diesel::RunQueryDsl;
                let model_id = model_id.to_string();
                self.run(move |conn| {
                    dsl::model_versions
                        .filter(dsl::model_id.eq(&model_id))
                        .order(dsl::created_at.asc())
                        .load::<crate::rows::ModelVersionRow>(conn)
                        .map(|rows| rows.into_iter().map(Into::into).collect())
                })
                .await
            }

            async fn write_files(
                &self,
                files: Vec<modelbox_domain::File>,
            ) -> modelbox_core::ModelBoxResult<Vec<modelbox_core::CreateResult>> {
                use diesel::RunQueryDsl;
                let registry_dup = self.registry.clone();
                let rows: Vec<crate::rows::BlobRow> =
                    files.iter().map(crate::rows::BlobRow::from).collect();
                self.run(move |conn| {
                    let mut results = Vec::with_capacity(rows.len());
                    for row in &rows {
                        use crate::schema::blobs::dsl;
                        let inserted = diesel::insert_into(dsl::blobs).values(row).execute(conn);
                        match inserted {
                            Ok(_) => results.push(modelbox_core::CreateResult::created(row.id.clone())),
                            Err(e) if registry_dup.is_duplicate(&e) => {
                                results.push(modelbox_core::CreateResult::existing(row.id.clone()))
                            }
                            Err(e) => return Err(e),
                        }
                    }
                    Ok(results)
                })
                .await
            }

            async fn get_file(&self, id: &str) -> modelbox_core::ModelBoxResult<modelbox_domain::File> {
                use crate::schema::blobs::dsl;
                use diesel::RunQueryDsl;
                let id = id.to_string();
                self.run(move |conn| {
                    dsl::blobs
                        .filter(dsl::id.eq(&id))
                        .first::<crate::rows::BlobRow>(conn)
                        .map(Into::into)
                })
                .await
            }

            async fn get_files(
                &self,
                parent_id: &str,
            ) -> modelbox_core::ModelBoxResult<Vec<modelbox_domain::File>> {
                use crate::schema::blobs::dsl;
                use diesel::RunQueryDsl;
                let parent_id = parent_id.to_string();
                self.run(move |conn| {
                    dsl::blobs
                        .filter(dsl::parent_id.eq(&parent_id))
                        .load::<crate::rows::BlobRow>(conn)
                        .map(|rows| rows.into_iter().map(Into::into).collect())
                })
                .await
            }

            async fn update_metadata(
                &self,
                parent_id: &str,
                updates: modelbox_domain::MetadataMap,
            ) -> modelbox_core::ModelBoxResult<()> {
                let parent_id = parent_id.to_string();
                let rows: Vec<crate::rows::MetadataRowSql> = updates
                    .into_iter()
                    .map(|(k, v)| {
                        (&modelbox_domain::MetadataRow::new(parent_id.clone(), k, v)).into()
                    })
                    .collect();
                let registry = self.registry.clone();
                self.run(move |conn| {
                    conn.transaction(|conn| upsert_metadata_rows(conn, &registry, &rows))
                })
                .await
            }

            async fn list_metadata(
                &self,
                parent_id: &str,
            ) -> modelbox_core::ModelBoxResult<modelbox_domain::MetadataMap> {
                use crate::schema::metadata::dsl;
                use diesel::RunQueryDsl;
                let parent_id = parent_id.to_string();
                self.run(move |conn| {
                    dsl::metadata
                        .filter(dsl::parent_id.eq(&parent_id))
                        .load::<crate::rows::MetadataRowSql>(conn)
                        .map(crate::rows::metadata_map_from_rows)
                })
                .await
            }

            async fn log_event(&self, event: modelbox_domain::Event) -> modelbox_core::ModelBoxResult<()> {
                use crate::schema::events::dsl;
                use diesel::RunQueryDsl;
                let row = crate::rows::EventRow::from(&event);
                let registry = self.registry.clone();
                self.run(move |conn| {
                    let inserted = diesel::insert_into(dsl::events).values(&row).execute(conn);
                    match inserted {
                        Ok(_) => Ok(()),
                        Err(e) if registry.is_duplicate(&e) => Ok(()),
                        Err(e) => Err(e),
                    }
                })
                .await
            }

            async fn list_events(
                &self,
                parent_id: &str,
            ) -> modelbox_core::ModelBoxResult<Vec<modelbox_domain::Event>> {
                use crate::schema::events::dsl;
                use diesel::RunQueryDsl;
                let parent_id = parent_id.to_string();
                self.run(move |conn| {
                    dsl::events
                        .filter(dsl::parent_id.eq(&parent_id))
                        .order(dsl::wallclock.asc())
                        .load::<crate::rows::EventRow>(conn)
                        .map(|rows| rows.into_iter().map(Into::into).collect())
                })
                .await
            }

            async fn create_trigger(
                &self,
                parent_id: &str,
                trigger: modelbox_domain::Trigger,
            ) -> modelbox_core::ModelBoxResult<()> {
                use crate::schema::triggers::dsl;
                use diesel::RunQueryDsl;
                let id = modelbox_domain::ids::IdHasher::new()
                    .feed_str(parent_id)
                    .feed_str(&trigger.payload)
                    .finish();
                let row = crate::rows::TriggerRow::new(parent_id, &id, &trigger);
                let registry = self.registry.clone();
                self.run(move |conn| {
                    let inserted = diesel::insert_into(dsl::triggers).values(&row).execute(conn);
                    match inserted {
                        Ok(_) => Ok(()),
                        Err(e) if registry.is_duplicate(&e) => Ok(()),
                        Err(e) => Err(e),
                    }
                })
                .await
            }

            async fn get_triggers(
                &self,
                parent_id: &str,
            ) -> modelbox_core::ModelBoxResult<Vec<modelbox_domain::Trigger>> {
                use crate::schema::triggers::dsl;
                use diesel::RunQueryDsl;
                let parent_id = parent_id.to_string();
                self.run(move |conn| {
                    dsl::triggers
                        .filter(dsl::parent_id.eq(&parent_id))
                        .load::<crate::rows::TriggerRow>(conn)
                        .map(|rows| rows.into_iter().map(Into::into).collect())
                })
                .await
            }

            async fn list_changes(
                &self,
                namespace: &str,
                since: u64,
            ) -> modelbox_core::ModelBoxResult<Vec<modelbox_domain::change_event::ChangeEvent>> {
                use crate::schema::mutation_events::dsl;
                use diesel::RunQueryDsl;
                let namespace = namespace.to_string();
                self.run(move |conn| {
                    dsl::mutation_events
                        .filter(dsl::namespace.eq(&namespace))
                        .filter(dsl::mutation_id.gt(since as i64))
                        .order(dsl::mutation_id.asc())
                        .load::<crate::rows::MutationEventRow>(conn)
                        .map(|rows| rows.into_iter().map(Into::into).collect())
                })
                .await
            }

            async fn get_unprocessed_change_events(
                &self,
            ) -> modelbox_core::ModelBoxResult<Vec<modelbox_domain::change_event::ChangeEvent>> {
                use crate::schema::mutation_events::dsl;
                use diesel::RunQueryDsl;
                self.run(move |conn| {
                    dsl::mutation_events
                        .filter(dsl::processed_at.eq(0))
                        .order(dsl::mutation_id.asc())
                        .load::<crate::rows::MutationEventRow>(conn)
                        .map(|rows| rows.into_iter().map(Into::into).collect())
                })
                .await
            }

            async fn mark_change_event_processed(
                &self,
                mutation_id: u64,
                processed_at: u64,
            ) -> modelbox_core::ModelBoxResult<()> {
                use crate::schema::mutation_events::dsl;
                use diesel::RunQueryDsl;
                self.run(move |conn| {
                    diesel::update(dsl::mutation_events.filter(dsl::mutation_id.eq(mutation_id as i64)))
                        .set(dsl::processed_at.eq(processed_at as i64))
                        .execute(conn)
                        .map(|_| ())
                })
                .await
            }

            async fn create_action(
                &self,
                action: modelbox_domain::Action,
            ) -> modelbox_core::ModelBoxResult<modelbox_core::CreateResult> {
                use crate::schema::actions::dsl;
                use diesel::RunQueryDsl;
                let row = crate::rows::ActionRow::from(&action);
                let id = action.id.clone();
                let registry = self.registry.clone();
                let change = modelbox_domain::change_event::ChangeEvent::draft(
                    modelbox_domain::EventType::ActionCreated,
                    id.clone(),
                    modelbox_domain::ObjectType::Action,
                    action.parent_id.clone(),
                    String::new(),
                    None,
                );
                self.run(move |conn| {
                    conn.transaction(|conn| {
                        let inserted = diesel::insert_into(dsl::actions).values(&row).execute(conn);
                        match inserted {
                            Ok(_) => {
                                insert_mutation_event(conn, &change)?;
                                Ok(modelbox_core::CreateResult::created(id.clone()))
                            }
                            Err(e) if registry.is_duplicate(&e) => {
                                Ok(modelbox_core::CreateResult::existing(id.clone()))
                            }
                            Err(e) => Err(e),
                        }
                    })
                })
                .await
            }

            async fn get_action(
                &self,
                id: &str,
            ) -> modelbox_core::ModelBoxResult<(modelbox_domain::Action, Vec<modelbox_domain::ActionInstance>)>
            {
                use crate::schema::action_instances::dsl as idsl;
                use crate::schema::actions::dsl as adsl;
                use diesel::RunQueryDsl;
                let id = id.to_string();
                self.run(move |conn| {
                    let action = adsl::actions
                        .filter(adsl::id.eq(&id))
                        .first::<crate::rows::ActionRow>(conn)?;
                    let instances = idsl::action_instances
                        .filter(idsl::action_id.eq(&id))
                        .order(idsl::attempt.asc())
                        .load::<crate::rows::ActionInstanceRow>(conn)?;
                    Ok((action.into(), instances.into_iter().map(Into::into).collect()))
                })
                .await
            }

            async fn list_actions(
                &self,
                ids: &[String],
            ) -> modelbox_core::ModelBoxResult<Vec<(modelbox_domain::Action, Vec<modelbox_domain::ActionInstance>)>>
            {
                use crate::schema::action_instances::dsl as idsl;
                use crate::schema::actions::dsl as adsl;
                use diesel::RunQueryDsl;
                let ids = ids.to_vec();
                self.run(move |conn| {
                    let actions = adsl::actions
                        .filter(adsl::id.eq_any(&ids))
                        .load::<crate::rows::ActionRow>(conn)?;
                    let mut out = Vec::with_capacity(actions.len());
                    for action in actions {
                        let instances = idsl::action_instances
                            .filter(idsl::action_id.eq(&action.id))
                            .order(idsl::attempt.asc())
                            .load::<crate::rows::ActionInstanceRow>(conn)?;
                        out.push((action.into(), instances.into_iter().map(Into::into).collect()));
                    }
                    Ok(out)
                })
                .await
            }

            async fn create_action_instance(
                &self,
                instance: modelbox_domain::ActionInstance,
                triggering_event_mutation_id: u64,
                now: u64,
            ) -> modelbox_core::ModelBoxResult<()> {
                use crate::schema::action_instances::dsl as idsl;
                use crate::schema::mutation_events::dsl as mdsl;
                use diesel::RunQueryDsl;
                let row = crate::rows::ActionInstanceRow::from(&instance);
                let action_id = instance.action_id.clone();
                let instance_id = instance.id.clone();
                let change = modelbox_domain::change_event::ChangeEvent::draft(
                    modelbox_domain::EventType::ActionInstanceCreated,
                    instance_id,
                    modelbox_domain::ObjectType::ActionInstance,
                    action_id,
                    String::new(),
                    None,
                );
                self.run(move |conn| {
                    conn.transaction(|conn| {
                        diesel::insert_into(idsl::action_instances)
                            .values(&row)
                            .execute(conn)?;
                        diesel::update(
                            mdsl::mutation_events
                                .filter(mdsl::mutation_id.eq(triggering_event_mutation_id as i64)),
                        )
                        .set(mdsl::processed_at.eq(now as i64))
                        .execute(conn)?;
                        insert_mutation_event(conn, &change)?;
                        Ok(())
                    })
                })
                .await
            }

            async fn update_action_instance(
                &self,
                instance_id: &str,
                new_status: modelbox_domain::Status,
                outcome: modelbox_domain::Outcome,
                outcome_reason: &str,
                now: u64,
            ) -> modelbox_core::ModelBoxResult<bool> {
                use crate::schema::action_instances::dsl;
                use diesel::RunQueryDsl;
                let instance_id = instance_id.to_string();
                let outcome_reason = outcome_reason.to_string();
                self.run(move |conn| {
                    conn.transaction(|conn| {
                        let mut current = dsl::action_instances
                            .filter(dsl::id.eq(&instance_id))
                            .first::<crate::rows::ActionInstanceRow>(conn)?;
                        let mut instance: modelbox_domain::ActionInstance = current.clone().into();
                        let applied = instance.apply_update(new_status, outcome, outcome_reason, now);
                        if !applied {
                            return Ok(false);
                        }
                        current = crate::rows::ActionInstanceRow::from(&instance);
                        diesel::update(dsl::action_instances.filter(dsl::id.eq(&instance_id)))
                            .set((
                                dsl::status.eq(current.status),
                                dsl::outcome.eq(current.outcome),
                                dsl::outcome_reason.eq(current.outcome_reason),
                                dsl::updated_at.eq(current.updated_at),
                                dsl::finished_at.eq(current.finished_at),
                            ))
                            .execute(conn)?;
                        let change = modelbox_domain::change_event::ChangeEvent::draft(
                            modelbox_domain::EventType::for_action_instance_transition(
                                instance.status,
                                instance.outcome,
                            ),
                            instance.id.clone(),
                            modelbox_domain::ObjectType::ActionInstance,
                            instance.action_id.clone(),
                            String::new(),
                            None,
                        );
                        insert_mutation_event(conn, &change)?;
                        Ok(true)
                    })
                })
                .await
            }

            async fn get_runnable_action_instances(
                &self,
                arch: &str,
            ) -> modelbox_core::ModelBoxResult<Vec<modelbox_domain::ActionInstance>> {
                use crate::schema::action_instances::dsl as idsl;
                use crate::schema::actions::dsl as adsl;
                use diesel::RunQueryDsl;
                let arch = arch.to_string();
                self.run(move |conn| {
                    let action_ids: Vec<String> = adsl::actions
                        .filter(adsl::arch.eq(&arch))
                        .select(adsl::id)
                        .load(conn)?;
                    idsl::action_instances
                        .filter(idsl::action_id.eq_any(&action_ids))
                        .filter(idsl::status.eq("pending"))
                        .order(idsl::created_at.asc())
                        .load::<crate::rows::ActionInstanceRow>(conn)
                        .map(|rows| rows.into_iter().map(Into::into).collect())
                })
                .await
            }

            async fn register_agent(
                &self,
                agent: modelbox_domain::Agent,
                now: u64,
            ) -> modelbox_core::ModelBoxResult<String> {
                use crate::schema::agents::dsl;
                use diesel::RunQueryDsl;
                let row = crate::rows::AgentRow::new(&agent, now);
                let id = agent.id.clone();
                let registry = self.registry.clone();
                self.run(move |conn| {
                    let inserted = diesel::insert_into(dsl::agents).values(&row).execute(conn);
                    match inserted {
                        Ok(_) => Ok(id.clone()),
                        Err(e) if registry.is_duplicate(&e) => {
                            diesel::update(dsl::agents.filter(dsl::id.eq(&id)))
                                .set(dsl::heartbeat_time.eq(now as i64))
                                .execute(conn)?;
                            Ok(id.clone())
                        }
                        Err(e) => Err(e),
                    }
                })
                .await
            }

            async fn heartbeat(&self, agent_id: &str, t: u64) -> modelbox_core::ModelBoxResult<()> {
                use crate::schema::agents::dsl;
                use diesel::RunQueryDsl;
                let agent_id = agent_id.to_string();
                self.run(move |conn| {
                    diesel::update(dsl::agents.filter(dsl::id.eq(&agent_id)))
                        .set(dsl::heartbeat_time.eq(t as i64))
                        .execute(conn)
                        .map(|_| ())
                })
                .await
            }

            async fn get_dead_agents(
                &self,
                now: u64,
                stale_threshold_secs: u64,
            ) -> modelbox_core::ModelBoxResult<Vec<modelbox_domain::Agent>> {
                use crate::schema::agents::dsl;
                use diesel::RunQueryDsl;
                let cutoff = now.saturating_sub(stale_threshold_secs) as i64;
                self.run(move |conn| {
                    dsl::agents
                        .filter(dsl::heartbeat_time.lt(cutoff))
                        .load::<crate::rows::AgentRow>(conn)
                        .map(|rows| rows.into_iter().map(Into::into).collect())
                })
                .await
            }
        }
    };
}

pub(crate) use impl_sql_metadata_store;
