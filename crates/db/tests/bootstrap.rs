use sqlx::PgPool;

/// Connect, migrate, verify the seeded obligation groups.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    notifications_db::health_check(&pool).await.unwrap();

    let codes: Vec<String> = sqlx::query_scalar("SELECT code FROM companies_groups ORDER BY id")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(codes, ["f-gases-eu", "f-gases-noneu", "ods", "cars", "vans"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_group_counts_start_at_zero(pool: PgPool) {
    let groups = notifications_db::repositories::CompaniesGroupRepo::list_with_counts(&pool)
        .await
        .unwrap();
    assert_eq!(groups.len(), 5);
    assert!(groups.iter().all(|g| g.count_emailtemplates == 0));
}
