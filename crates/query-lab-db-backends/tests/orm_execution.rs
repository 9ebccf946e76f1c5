//! Integration tests for the ORM execution pipeline.
//!
//! Models are declared here, their tables created on an in-memory SQLite
//! database, and every query goes through SQL compilation, execution and
//! row mapping.

use std::sync::LazyLock;

use chrono::NaiveDate;
use query_lab_core::{OrmError, OrmResult};
use query_lab_db::query::expressions::{coalesce, greatest, least, round};
use query_lab_db::{
    bulk_create, bulk_update, create_model, create_tables, delete_model, refresh_model,
    save_model, AggregateFunc, Expression, FieldDef, FieldType, Lookup, ManyToMany, Model,
    ModelMeta, OnDelete, OrderBy, Relation, Row, Value, When, Q,
};
use query_lab_db_backends::SqliteBackend;

// ── Test model definitions ────────────────────────────────────────────

const TEAM_PLAYERS: Relation = Relation::Reverse {
    table: "league_player",
    fk: "team_id",
};

const PLAYER_TEAM: Relation = Relation::Forward {
    table: "league_team",
    fk: "team_id",
};

const TAGS: ManyToMany = ManyToMany::new(
    "league_player",
    "league_tag",
    "league_player_tags",
    "player_id",
    "tag_id",
);

#[derive(Debug, Clone, PartialEq)]
struct Team {
    id: i64,
    name: String,
    founded: NaiveDate,
}

impl Team {
    fn new(name: &str, year: i32) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            founded: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
        }
    }
}

impl Model for Team {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("league", "team", "league_team").fields(vec![
                FieldDef::auto_id(),
                FieldDef::new("name", FieldType::CharField)
                    .max_length(50)
                    .unique(),
                FieldDef::new("founded", FieldType::DateField),
            ])
        });
        &META
    }

    fn pk(&self) -> Option<Value> {
        (self.id != 0).then_some(Value::Int(self.id))
    }

    fn set_pk(&mut self, value: Value) {
        if let Value::Int(id) = value {
            self.id = id;
        }
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::Int(self.id)),
            ("name", Value::from(&self.name)),
            ("founded", Value::Date(self.founded)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            founded: row.get("founded")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Player {
    id: i64,
    name: String,
    goals: i64,
    rating: f64,
    team_id: Option<i64>,
}

impl Player {
    fn new(name: &str, goals: i64, rating: f64, team: Option<&Team>) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            goals,
            rating,
            team_id: team.map(|t| t.id),
        }
    }
}

impl Model for Player {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("league", "player", "league_player").fields(vec![
                FieldDef::auto_id(),
                FieldDef::new("name", FieldType::CharField).max_length(50),
                FieldDef::new("goals", FieldType::IntegerField).default(0),
                FieldDef::new("rating", FieldType::FloatField).default(0.0),
                FieldDef::new(
                    "team",
                    FieldType::ForeignKey {
                        to: "league_team".into(),
                        on_delete: OnDelete::SetNull,
                        related_name: None,
                    },
                )
                .column("team_id")
                .nullable(),
                FieldDef::new(
                    "tags",
                    FieldType::ManyToManyField {
                        to: TAGS.table.into(),
                        through: TAGS.through.into(),
                        source: TAGS.source.into(),
                        target: TAGS.target.into(),
                        related_name: None,
                    },
                ),
            ])
        });
        &META
    }

    fn pk(&self) -> Option<Value> {
        (self.id != 0).then_some(Value::Int(self.id))
    }

    fn set_pk(&mut self, value: Value) {
        if let Value::Int(id) = value {
            self.id = id;
        }
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::Int(self.id)),
            ("name", Value::from(&self.name)),
            ("goals", Value::Int(self.goals)),
            ("rating", Value::Float(self.rating)),
            ("team", Value::from(self.team_id)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            goals: row.get("goals")?,
            rating: row.get("rating")?,
            team_id: row.get("team_id")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Tag {
    id: i64,
    label: String,
}

impl Model for Tag {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("league", "tag", "league_tag").fields(vec![
                FieldDef::auto_id(),
                FieldDef::new("label", FieldType::CharField).max_length(20),
            ])
        });
        &META
    }

    fn pk(&self) -> Option<Value> {
        (self.id != 0).then_some(Value::Int(self.id))
    }

    fn set_pk(&mut self, value: Value) {
        if let Value::Int(id) = value {
            self.id = id;
        }
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![("id", Value::Int(self.id)), ("label", Value::from(&self.label))]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            label: row.get("label")?,
        })
    }
}

// ── Fixtures ──────────────────────────────────────────────────────────

async fn setup() -> SqliteBackend {
    let db = SqliteBackend::memory().unwrap();
    create_tables(&db, &[Team::meta(), Tag::meta(), Player::meta()])
        .await
        .unwrap();
    db
}

struct League {
    db: SqliteBackend,
    rovers: Team,
    united: Team,
    players: Vec<Player>,
}

async fn league() -> League {
    let db = setup().await;
    let mut rovers = Team::new("Rovers", 1901);
    let mut united = Team::new("United", 1999);
    let mut empty = Team::new("Wanderers", 2020);
    for team in [&mut rovers, &mut united, &mut empty] {
        create_model(team, &db).await.unwrap();
    }

    let mut players = vec![
        Player::new("Ana", 12, 7.5, Some(&rovers)),
        Player::new("Ben", 3, 6.0, Some(&rovers)),
        Player::new("Cleo", 20, 8.5, Some(&united)),
        Player::new("Dan", 0, 5.0, None),
    ];
    bulk_create(&mut players, &db).await.unwrap();
    League {
        db,
        rovers,
        united,
        players,
    }
}

fn names(players: &[Player]) -> Vec<&str> {
    players.iter().map(|p| p.name.as_str()).collect()
}

// ── CRUD ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_sets_pk_and_save_updates() {
    let db = setup().await;
    let mut team = Team::new("Rovers", 1901);
    assert!(team.pk().is_none());
    create_model(&mut team, &db).await.unwrap();
    assert!(team.id > 0);

    team.name = "Rovers FC".to_string();
    save_model(&mut team, &db).await.unwrap();
    let stored = Team::objects().all().get_exec(&db).await.unwrap();
    assert_eq!(stored, team);
}

#[tokio::test]
async fn test_save_without_pk_inserts() {
    let db = setup().await;
    let mut team = Team::new("Rovers", 1901);
    save_model(&mut team, &db).await.unwrap();
    assert!(team.id > 0);
    assert_eq!(Team::objects().all().count_exec(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_unique_violation_is_integrity_error() {
    let db = setup().await;
    create_model(&mut Team::new("Rovers", 1901), &db).await.unwrap();
    let err = create_model(&mut Team::new("Rovers", 1950), &db)
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::IntegrityError(_)));
}

#[tokio::test]
async fn test_refresh_reloads_row() {
    let League { db, players, .. } = league().await;
    let mut ana = players[0].clone();
    Player::objects()
        .filter(Q::filter("id", Lookup::Exact(Value::Int(ana.id))))
        .update(vec![("goals", Expression::value(99))])
        .update_exec(&db)
        .await
        .unwrap();
    assert_eq!(ana.goals, 12);
    refresh_model(&mut ana, &db).await.unwrap();
    assert_eq!(ana.goals, 99);
}

#[tokio::test]
async fn test_delete_model_and_set_null() {
    let League {
        db, rovers, players, ..
    } = league().await;
    assert_eq!(delete_model(&rovers, &db).await.unwrap(), 1);

    let ana = Player::objects()
        .filter(Q::filter("id", Lookup::Exact(Value::Int(players[0].id))))
        .get_exec(&db)
        .await
        .unwrap();
    assert_eq!(ana.team_id, None);
}

#[tokio::test]
async fn test_bulk_update_selected_fields() {
    let League {
        db, mut players, ..
    } = league().await;
    for p in &mut players {
        p.goals += 1;
        p.name = "ignored".to_string();
    }
    assert_eq!(bulk_update(&players, &["goals"], &db).await.unwrap(), 4);

    let stored = Player::objects()
        .all()
        .order_by(vec![OrderBy::asc("id")])
        .execute_query(&db)
        .await
        .unwrap();
    assert_eq!(names(&stored), ["Ana", "Ben", "Cleo", "Dan"]);
    let goals: Vec<i64> = stored.iter().map(|p| p.goals).collect();
    assert_eq!(goals, [13, 4, 21, 1]);
}

// ── QuerySet execution ────────────────────────────────────────────────

#[tokio::test]
async fn test_filter_exclude_and_order() {
    let League { db, .. } = league().await;
    let scorers = Player::objects()
        .filter(Q::filter("goals", Lookup::Gte(Value::Int(3))))
        .exclude(Q::filter("name", Lookup::IStartsWith("c".to_string())))
        .order_by(vec![OrderBy::desc("goals")])
        .execute_query(&db)
        .await
        .unwrap();
    assert_eq!(names(&scorers), ["Ana", "Ben"]);

    let either = Player::objects()
        .filter(
            Q::filter("rating", Lookup::Gt(Value::Float(8.0)))
                | Q::filter("team_id", Lookup::IsNull(true)),
        )
        .order_by(vec![OrderBy::asc("name")])
        .execute_query(&db)
        .await
        .unwrap();
    assert_eq!(names(&either), ["Cleo", "Dan"]);
}

#[tokio::test]
async fn test_in_range_and_contains() {
    let League { db, .. } = league().await;
    let picked = Player::objects()
        .filter(Q::filter(
            "name",
            Lookup::In(vec![Value::from("Ben"), Value::from("Dan")]),
        ))
        .filter(Q::filter(
            "goals",
            Lookup::Range(Value::Int(0), Value::Int(3)),
        ))
        .count_exec(&db)
        .await
        .unwrap();
    assert_eq!(picked, 2);

    let case_sensitive = Player::objects()
        .filter(Q::filter("name", Lookup::Contains("an".to_string())))
        .count_exec(&db)
        .await
        .unwrap();
    let case_insensitive = Player::objects()
        .filter(Q::filter("name", Lookup::IContains("an".to_string())))
        .count_exec(&db)
        .await
        .unwrap();
    assert_eq!((case_sensitive, case_insensitive), (1, 2));
}

#[tokio::test]
async fn test_year_lookup() {
    let League { db, .. } = league().await;
    let team = Team::objects()
        .filter(Q::filter("founded", Lookup::Year(1999)))
        .get_exec(&db)
        .await
        .unwrap();
    assert_eq!(team.name, "United");
}

#[tokio::test]
async fn test_first_last_and_exists() {
    let League { db, .. } = league().await;
    let by_goals = Player::objects()
        .all()
        .order_by(vec![OrderBy::desc("goals")]);
    assert_eq!(by_goals.first_exec(&db).await.unwrap().unwrap().name, "Cleo");
    assert_eq!(by_goals.last_exec(&db).await.unwrap().unwrap().name, "Dan");
    assert_eq!(
        Player::objects().all().last_exec(&db).await.unwrap().unwrap().name,
        "Dan"
    );

    assert!(Player::objects().all().exists_exec(&db).await.unwrap());
    assert!(!Player::objects().none().exists_exec(&db).await.unwrap());
    assert!(Player::objects()
        .filter(Q::filter("goals", Lookup::Gt(Value::Int(100))))
        .first_exec(&db)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_get_errors() {
    let League { db, .. } = league().await;
    let missing = Player::objects()
        .filter(Q::filter("name", Lookup::Exact(Value::from("Zoe"))))
        .get_exec(&db)
        .await
        .unwrap_err();
    assert!(matches!(missing, OrmError::DoesNotExist(_)));

    let many = Player::objects().all().get_exec(&db).await.unwrap_err();
    assert!(matches!(many, OrmError::MultipleObjectsReturned(_)));
}

#[tokio::test]
async fn test_values_and_limit() {
    let League { db, .. } = league().await;
    let rows = Player::objects()
        .all()
        .values(&["name"])
        .order_by(vec![OrderBy::desc("rating")])
        .limit(2)
        .values_exec(&db)
        .await
        .unwrap();
    let top: Vec<String> = rows.iter().map(|r| r.get("name").unwrap()).collect();
    assert_eq!(top, ["Cleo", "Ana"]);
}

// ── Annotations and aggregates ────────────────────────────────────────

#[tokio::test]
async fn test_related_count_and_aggregate() {
    let League { db, .. } = league().await;
    let teams = Team::objects()
        .all()
        .annotate("players", Expression::related_count([TEAM_PLAYERS]))
        .annotate(
            "best",
            Expression::related_aggregate(AggregateFunc::Max, [TEAM_PLAYERS], "goals"),
        )
        .order_by(vec![OrderBy::desc("players"), OrderBy::asc("name")])
        .execute_annotated(&db)
        .await
        .unwrap();

    let summary: Vec<(String, i64, Option<i64>)> = teams
        .iter()
        .map(|t| {
            (
                t.model.name.clone(),
                t.get("players").unwrap(),
                t.get("best").unwrap(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Rovers".to_string(), 2, Some(12)),
            ("United".to_string(), 1, Some(20)),
            ("Wanderers".to_string(), 0, None),
        ]
    );
}

#[tokio::test]
async fn test_filter_on_annotation() {
    let League { db, .. } = league().await;
    let busy = Team::objects()
        .all()
        .annotate("players", Expression::related_count([TEAM_PLAYERS]))
        .filter(Q::filter("players", Lookup::Gt(Value::Int(1))))
        .execute_query(&db)
        .await
        .unwrap();
    assert_eq!(busy.len(), 1);
    assert_eq!(busy[0].name, "Rovers");
}

#[tokio::test]
async fn test_related_field_and_related_filter() {
    let League { db, .. } = league().await;
    let dan = Player::objects()
        .filter(Q::filter("name", Lookup::Exact(Value::from("Dan"))))
        .annotate("team_name", Expression::related_field([PLAYER_TEAM], "name"))
        .first_annotated(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(dan.get::<Option<String>>("team_name").unwrap(), None);

    let old_club = Player::objects()
        .filter(Q::related(
            [PLAYER_TEAM],
            Q::filter("founded", Lookup::Lt(Value::Date(
                NaiveDate::from_ymd_opt(1950, 1, 1).unwrap(),
            ))),
        ))
        .order_by(vec![OrderBy::asc("name")])
        .execute_query(&db)
        .await
        .unwrap();
    assert_eq!(names(&old_club), ["Ana", "Ben"]);
}

#[tokio::test]
async fn test_aggregate_exec() {
    let League { db, .. } = league().await;
    let row = Player::objects()
        .filter(Q::filter("team_id", Lookup::IsNull(false)))
        .aggregate_exec(
            &db,
            vec![
                (
                    "total",
                    Expression::aggregate(AggregateFunc::Sum, Expression::col("goals")),
                ),
                (
                    "avg_rating",
                    Expression::aggregate(AggregateFunc::Avg, Expression::col("rating")),
                ),
            ],
        )
        .await
        .unwrap();
    assert_eq!(row.get::<i64>("total").unwrap(), 35);
    assert!((row.get::<f64>("avg_rating").unwrap() - 22.0 / 3.0).abs() < 1e-9);

    let empty = Player::objects()
        .filter(Q::filter("goals", Lookup::Gt(Value::Int(100))))
        .aggregate_exec(
            &db,
            vec![(
                "total",
                coalesce(vec![
                    Expression::aggregate(AggregateFunc::Sum, Expression::col("goals")),
                    Expression::value(0),
                ]),
            )],
        )
        .await
        .unwrap();
    assert_eq!(empty.get::<i64>("total").unwrap(), 0);
}

// ── Updates and deletes ───────────────────────────────────────────────

#[tokio::test]
async fn test_update_with_f_and_functions() {
    let League { db, .. } = league().await;
    let updated = Player::objects()
        .all()
        .update(vec![
            (
                "goals",
                greatest(vec![
                    Expression::f("goals") - Expression::value(5),
                    Expression::value(0),
                ]),
            ),
            (
                "rating",
                round(
                    least(vec![
                        Expression::f("rating") * Expression::value(1.2),
                        Expression::value(9.0),
                    ]),
                    Some(1),
                ),
            ),
        ])
        .update_exec(&db)
        .await
        .unwrap();
    assert_eq!(updated, 4);

    let stored: Vec<(i64, f64)> = Player::objects()
        .all()
        .order_by(vec![OrderBy::asc("id")])
        .execute_query(&db)
        .await
        .unwrap()
        .into_iter()
        .map(|p| (p.goals, p.rating))
        .collect();
    assert_eq!(stored, vec![(7, 9.0), (0, 7.2), (15, 9.0), (0, 6.0)]);
}

#[tokio::test]
async fn test_update_with_case() {
    let League { db, .. } = league().await;
    let grade = Expression::case(
        vec![
            When::new(Q::filter("goals", Lookup::Gte(Value::Int(15))), "Star"),
            When::new(Q::filter("goals", Lookup::Gte(Value::Int(5))), "Regular"),
        ],
        Some(Expression::f("name")),
    );
    Player::objects()
        .all()
        .update(vec![("name", grade)])
        .update_exec(&db)
        .await
        .unwrap();

    let stored = Player::objects()
        .all()
        .order_by(vec![OrderBy::asc("id")])
        .execute_query(&db)
        .await
        .unwrap();
    assert_eq!(names(&stored), ["Regular", "Ben", "Star", "Dan"]);
}

#[tokio::test]
async fn test_update_through_annotation() {
    let League { db, .. } = league().await;
    let updated = Team::objects()
        .all()
        .annotate("players", Expression::related_count([TEAM_PLAYERS]))
        .filter(Q::filter("players", Lookup::Exact(Value::Int(0))))
        .update(vec![("name", Expression::value("Dormant"))])
        .update_exec(&db)
        .await
        .unwrap();
    assert_eq!(updated, 1);
    assert!(Team::objects()
        .filter(Q::filter("name", Lookup::Exact(Value::from("Dormant"))))
        .exists_exec(&db)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_queryset_delete() {
    let League { db, united, .. } = league().await;
    let deleted = Player::objects()
        .filter(Q::filter("team_id", Lookup::Exact(Value::Int(united.id))))
        .delete()
        .delete_exec(&db)
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(Player::objects().all().count_exec(&db).await.unwrap(), 3);
}

// ── Many-to-many ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_many_to_many_links() {
    let League {
        db, rovers, players, ..
    } = league().await;
    let mut tags = vec![
        Tag {
            id: 0,
            label: "captain".into(),
        },
        Tag {
            id: 0,
            label: "veteran".into(),
        },
    ];
    bulk_create(&mut tags, &db).await.unwrap();
    let (ana, ben) = (&players[0], &players[1]);

    TAGS.add(&db, ana.id, &[tags[0].id, tags[1].id]).await.unwrap();
    TAGS.add(&db, ben.id, &[tags[1].id]).await.unwrap();
    assert_eq!(
        TAGS.target_ids(&db, ana.id).await.unwrap(),
        vec![tags[0].id, tags[1].id]
    );

    let tagged = Player::objects()
        .filter(Q::related(
            [TAGS.forward()],
            Q::filter("label", Lookup::Exact(Value::from("veteran"))),
        ))
        .filter(Q::filter("team_id", Lookup::Exact(Value::Int(rovers.id))))
        .order_by(vec![OrderBy::asc("name")])
        .execute_query(&db)
        .await
        .unwrap();
    assert_eq!(names(&tagged), ["Ana", "Ben"]);

    let labels: Vec<String> = TAGS
        .targets::<Tag>(ana.id)
        .order_by(vec![OrderBy::desc("label")])
        .execute_query(&db)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.label)
        .collect();
    assert_eq!(labels, ["veteran", "captain"]);

    TAGS.remove(&db, ana.id, &[tags[1].id]).await.unwrap();
    assert_eq!(TAGS.target_ids(&db, ana.id).await.unwrap(), vec![tags[0].id]);
    TAGS.clear(&db, ben.id).await.unwrap();
    assert!(TAGS.target_ids(&db, ben.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_many_to_many_count_distinct() {
    let League { db, players, .. } = league().await;
    let mut tag = Tag {
        id: 0,
        label: "scorer".into(),
    };
    create_model(&mut tag, &db).await.unwrap();
    let ids: Vec<i64> = players.iter().take(3).map(|p| p.id).collect();
    for id in &ids {
        TAGS.add(&db, *id, &[tag.id]).await.unwrap();
    }

    let tagged = Team::objects()
        .all()
        .annotate(
            "tagged_players",
            Expression::related_count([TEAM_PLAYERS, TAGS.forward()]).distinct(),
        )
        .order_by(vec![OrderBy::asc("name")])
        .execute_annotated(&db)
        .await
        .unwrap();
    let counts: Vec<i64> = tagged
        .iter()
        .map(|t| t.get("tagged_players").unwrap())
        .collect();
    assert_eq!(counts, [1, 1, 0]);
}
