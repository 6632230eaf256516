// ==========================================
// 车厢 API 集成测试
// ==========================================
// 测试目标: 位置紧凑不变量、重排序全量替换、克隆插入、
//           幂等归一化 (创建/更新/删除/克隆/重排序全路径)
// ==========================================


use std::sync::{Arc, Mutex};
use train_composer::domain::wagon::{PositionAssignment, WagonPatch};
use train_composer::logging;
use train_composer::{ApiError, TrainApi, TrainRepository, WagonApi, WagonRepository};

/// 装配 API 与底层仓储 (共享单连接), 供需要直接操库的测试使用
fn create_stack() -> (
    tempfile::NamedTempFile,
    Arc<TrainApi>,
    Arc<WagonApi>,
    Arc<WagonRepository>,
) {
    let (temp_file, db_path) = test_helpers::create_test_db().expect("创建测试库失败");
    let conn = test_helpers::open_test_connection(&db_path).expect("打开连接失败");
    let conn = Arc::new(Mutex::new(conn));

    let train_repo = Arc::new(TrainRepository::from_connection(conn.clone()));
    let wagon_repo = Arc::new(WagonRepository::from_connection(conn));
    let train_api = Arc::new(TrainApi::new(train_repo, wagon_repo.clone()));
    let wagon_api = Arc::new(WagonApi::new(wagon_repo.clone()));

    (temp_file, train_api, wagon_api, wagon_repo)
}

/// 创建一列带 N 节车厢的列车, 返回 (train_id, 车厢id列表)
fn seed_train(train_api: &TrainApi, wagon_api: &WagonApi, wagon_count: i64) -> (i64, Vec<i64>) {
    let train = train_api
        .create_train(&test_helpers::train_draft("编组操作测试"))
        .expect("创建列车应该成功");

    let mut wagon_ids = Vec::new();
    for position in 1..=wagon_count {
        let wagon = wagon_api
            .create_wagon(train.id, &test_helpers::wagon_draft(position))
            .expect("创建车厢应该成功");
        wagon_ids.push(wagon.id);
    }
    (train.id, wagon_ids)
}

// ==========================================
// 创建 / 更新 / 删除
// ==========================================

#[test]
fn test_create_keeps_positions_dense() {
    logging::init_test();
    let (_tmp, train_api, wagon_api, _repo) = create_stack();
    let (train_id, _ids) = seed_train(&train_api, &wagon_api, 3);

    let wagons = wagon_api.list_wagons(train_id).expect("查询应该成功");
    test_helpers::assert_dense(&wagons);
    assert_eq!(test_helpers::positions(&wagons), vec![1, 2, 3]);
}

#[test]
fn test_create_at_occupied_position_lands_after_incumbent() {
    let (_tmp, train_api, wagon_api, _repo) = create_stack();
    let (train_id, ids) = seed_train(&train_api, &wagon_api, 3);

    // 插到已占用的位置 2: 并列时 id 大 (后插) 者排后
    let inserted = wagon_api
        .create_wagon(train_id, &test_helpers::wagon_draft(2))
        .expect("创建应该成功");
    assert_eq!(inserted.position, 3, "新车厢应排在原位置 2 车厢之后");

    let wagons = wagon_api.list_wagons(train_id).expect("查询应该成功");
    test_helpers::assert_dense(&wagons);
    assert_eq!(
        test_helpers::ids(&wagons),
        vec![ids[0], ids[1], inserted.id, ids[2]]
    );
}

#[test]
fn test_create_with_oversized_position_is_compacted() {
    let (_tmp, train_api, wagon_api, _repo) = create_stack();
    let (train_id, _ids) = seed_train(&train_api, &wagon_api, 2);

    // 位置 99 超出队尾: 归一化收敛到 3
    let inserted = wagon_api
        .create_wagon(train_id, &test_helpers::wagon_draft(99))
        .expect("创建应该成功");
    assert_eq!(inserted.position, 3);

    let wagons = wagon_api.list_wagons(train_id).expect("查询应该成功");
    test_helpers::assert_dense(&wagons);
}

#[test]
fn test_create_rejects_unknown_train() {
    let (_tmp, _train_api, wagon_api, _repo) = create_stack();
    assert!(matches!(
        wagon_api.create_wagon(999, &test_helpers::wagon_draft(1)),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_update_position_moves_wagon_and_stays_dense() {
    let (_tmp, train_api, wagon_api, _repo) = create_stack();
    let (train_id, ids) = seed_train(&train_api, &wagon_api, 4);

    // 把队尾车厢提到位置 1: 与原 1 号并列, 并列按 id 决胜,
    // 原 1 号先插 id 更小排前, 移动者落位 2
    let moved = wagon_api
        .update_wagon(
            train_id,
            ids[3],
            &WagonPatch {
                position: Some(1),
                ..Default::default()
            },
        )
        .expect("更新应该成功");
    assert_eq!(moved.position, 2, "并列位置按 id 决胜");

    let wagons = wagon_api.list_wagons(train_id).expect("查询应该成功");
    test_helpers::assert_dense(&wagons);
    assert_eq!(
        test_helpers::ids(&wagons),
        vec![ids[0], ids[3], ids[1], ids[2]]
    );
}

#[test]
fn test_update_rejects_wagon_of_other_train() {
    let (_tmp, train_api, wagon_api, _repo) = create_stack();
    let (_train_a, ids_a) = seed_train(&train_api, &wagon_api, 1);
    let (train_b, _ids_b) = seed_train(&train_api, &wagon_api, 1);

    assert!(
        matches!(
            wagon_api.update_wagon(train_b, ids_a[0], &WagonPatch::default()),
            Err(ApiError::NotFound(_))
        ),
        "跨列车操作必须按未找到拒绝"
    );
}

#[test]
fn test_delete_compacts_remaining_positions() {
    let (_tmp, train_api, wagon_api, _repo) = create_stack();
    let (train_id, ids) = seed_train(&train_api, &wagon_api, 5);

    // 删除中间一节 (位置 3)
    wagon_api
        .delete_wagon(train_id, ids[2])
        .expect("删除应该成功");

    let wagons = wagon_api.list_wagons(train_id).expect("查询应该成功");
    test_helpers::assert_dense(&wagons);
    assert_eq!(wagons.len(), 4);
    assert_eq!(
        test_helpers::ids(&wagons),
        vec![ids[0], ids[1], ids[3], ids[4]],
        "剩余车厢保持相对顺序并前移补洞"
    );
}

#[test]
fn test_delete_rejects_unknown_wagon() {
    let (_tmp, train_api, wagon_api, _repo) = create_stack();
    let (train_id, _ids) = seed_train(&train_api, &wagon_api, 1);

    assert!(matches!(
        wagon_api.delete_wagon(train_id, 999),
        Err(ApiError::NotFound(_))
    ));
}

// ==========================================
// 克隆
// ==========================================

#[test]
fn test_clone_places_copies_after_source_and_shifts_tail() {
    let (_tmp, train_api, wagon_api, _repo) = create_stack();
    let (train_id, ids) = seed_train(&train_api, &wagon_api, 4);

    // 克隆位置 2 的车厢 3 份
    let clones = wagon_api
        .clone_wagons(train_id, ids[1], 3)
        .expect("克隆应该成功");

    assert_eq!(clones.len(), 3, "应返回恰好 Q 节新车厢");
    assert_eq!(
        test_helpers::positions(&clones),
        vec![3, 4, 5],
        "副本占据 P+1..P+Q"
    );

    let wagons = wagon_api.list_wagons(train_id).expect("查询应该成功");
    test_helpers::assert_dense(&wagons);
    assert_eq!(wagons.len(), 7);

    // 完整编组顺序: 源之前不动, 副本紧跟源车厢, 其后整体后移 Q 位
    assert_eq!(
        test_helpers::ids(&wagons),
        vec![
            ids[0],
            ids[1],
            clones[0].id,
            clones[1].id,
            clones[2].id,
            ids[2],
            ids[3],
        ],
        "副本不得与队尾车厢交错"
    );
    assert_eq!(test_helpers::positions(&wagons[5..]), vec![6, 7]);
}

#[test]
fn test_clone_tail_wagon_appends_at_end() {
    let (_tmp, train_api, wagon_api, _repo) = create_stack();
    let (train_id, ids) = seed_train(&train_api, &wagon_api, 2);

    // 克隆队尾车厢: 无需腾位, 副本直接续在末尾
    let clones = wagon_api
        .clone_wagons(train_id, ids[1], 2)
        .expect("克隆应该成功");
    assert_eq!(test_helpers::positions(&clones), vec![3, 4]);

    let wagons = wagon_api.list_wagons(train_id).expect("查询应该成功");
    test_helpers::assert_dense(&wagons);
    assert_eq!(
        test_helpers::ids(&wagons),
        vec![ids[0], ids[1], clones[0].id, clones[1].id]
    );
}

#[test]
fn test_clone_copies_physical_attributes() {
    let (_tmp, train_api, wagon_api, _repo) = create_stack();
    let (train_id, ids) = seed_train(&train_api, &wagon_api, 1);

    let source = wagon_api.list_wagons(train_id).expect("查询应该成功")[0].clone();
    let clones = wagon_api
        .clone_wagons(train_id, ids[0], 2)
        .expect("克隆应该成功");

    for clone in &clones {
        assert_ne!(clone.id, source.id);
        assert_eq!(clone.identifier, source.identifier);
        assert_eq!(clone.length_m, source.length_m);
        assert_eq!(clone.tare_weight_t, source.tare_weight_t);
        assert_eq!(clone.load_weight_t, source.load_weight_t);
        assert_eq!(clone.braked_weight_t, source.braked_weight_t);
        assert_eq!(clone.brake_type, source.brake_type);
        assert_eq!(clone.axle_count, source.axle_count);
    }
}

#[test]
fn test_clone_quantity_range_validation() {
    let (_tmp, train_api, wagon_api, _repo) = create_stack();
    let (train_id, ids) = seed_train(&train_api, &wagon_api, 1);

    assert!(matches!(
        wagon_api.clone_wagons(train_id, ids[0], 0),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        wagon_api.clone_wagons(train_id, ids[0], 21),
        Err(ApiError::InvalidInput(_))
    ));

    // 上界恰好允许
    let clones = wagon_api
        .clone_wagons(train_id, ids[0], 20)
        .expect("Q=20 应该成功");
    assert_eq!(clones.len(), 20);
    test_helpers::assert_dense(&wagon_api.list_wagons(train_id).expect("查询应该成功"));
}

#[test]
fn test_clone_rejects_missing_or_foreign_source() {
    let (_tmp, train_api, wagon_api, _repo) = create_stack();
    let (train_a, ids_a) = seed_train(&train_api, &wagon_api, 1);
    let (train_b, _ids_b) = seed_train(&train_api, &wagon_api, 1);

    assert!(matches!(
        wagon_api.clone_wagons(train_a, 999, 1),
        Err(ApiError::NotFound(_))
    ));
    assert!(
        matches!(
            wagon_api.clone_wagons(train_b, ids_a[0], 1),
            Err(ApiError::NotFound(_))
        ),
        "源车厢属于其他列车时必须拒绝"
    );
}

// ==========================================
// 重排序
// ==========================================

#[test]
fn test_reorder_is_a_bijection() {
    let (_tmp, train_api, wagon_api, _repo) = create_stack();
    let (train_id, ids) = seed_train(&train_api, &wagon_api, 4);

    let permutation = vec![ids[2], ids[0], ids[3], ids[1]];
    let reordered = wagon_api
        .reorder_wagons(train_id, &permutation)
        .expect("重排序应该成功");

    assert_eq!(
        test_helpers::ids(&reordered),
        permutation,
        "输出顺序必须与输入排列完全一致"
    );
    assert_eq!(test_helpers::positions(&reordered), vec![1, 2, 3, 4]);
    test_helpers::assert_dense(&reordered);
}

#[test]
fn test_reorder_validation_failures() {
    let (_tmp, train_api, wagon_api, _repo) = create_stack();
    let (train_id, ids) = seed_train(&train_api, &wagon_api, 3);

    // 空序列
    assert!(matches!(
        wagon_api.reorder_wagons(train_id, &[]),
        Err(ApiError::ValidationError(_))
    ));

    // 缺少一节
    assert!(matches!(
        wagon_api.reorder_wagons(train_id, &[ids[0], ids[1]]),
        Err(ApiError::ValidationError(_))
    ));

    // 混入外部 id
    assert!(matches!(
        wagon_api.reorder_wagons(train_id, &[ids[0], ids[1], ids[2], 999]),
        Err(ApiError::ValidationError(_))
    ));

    // 失败的重排序不应改动编组
    let wagons = wagon_api.list_wagons(train_id).expect("查询应该成功");
    assert_eq!(test_helpers::ids(&wagons), ids, "失败后编组保持原状");
}

#[test]
fn test_reorder_empty_train_is_not_found() {
    let (_tmp, train_api, wagon_api, _repo) = create_stack();
    let train = train_api
        .create_train(&test_helpers::train_draft("无车厢列车"))
        .expect("创建应该成功");

    assert!(matches!(
        wagon_api.reorder_wagons(train.id, &[1]),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_reorder_tolerates_duplicate_ids() {
    let (_tmp, train_api, wagon_api, _repo) = create_stack();
    let (train_id, ids) = seed_train(&train_api, &wagon_api, 2);

    // 防御性去重: 重复 id 保留首次出现顺序
    let reordered = wagon_api
        .reorder_wagons(train_id, &[ids[1], ids[0], ids[1]])
        .expect("去重后应该成功");
    assert_eq!(test_helpers::ids(&reordered), vec![ids[1], ids[0]]);
}

// ==========================================
// 位置归一化
// ==========================================

#[test]
fn test_normalize_repairs_corrupted_positions() {
    let (_tmp, train_api, wagon_api, wagon_repo) = create_stack();
    let (train_id, ids) = seed_train(&train_api, &wagon_api, 3);

    // 绕过 API 直接写坏位置 (模拟外部破坏): 7 / 7 / 42
    wagon_repo
        .in_transaction(|txn| {
            txn.apply_positions(&[
                PositionAssignment {
                    wagon_id: ids[0],
                    position: 7,
                },
                PositionAssignment {
                    wagon_id: ids[1],
                    position: 7,
                },
                PositionAssignment {
                    wagon_id: ids[2],
                    position: 42,
                },
            ])
        })
        .expect("直接写库应该成功");

    let rewrites = wagon_api.normalize(train_id).expect("归一化应该成功");
    assert!(rewrites > 0, "应有实际修复写入");

    let wagons = wagon_api.list_wagons(train_id).expect("查询应该成功");
    test_helpers::assert_dense(&wagons);
    // 位置并列 (7,7) 按 id 决胜: 先插者 id 小, 排前
    assert_eq!(test_helpers::ids(&wagons), ids);
}

#[test]
fn test_normalize_is_idempotent() {
    let (_tmp, train_api, wagon_api, _repo) = create_stack();
    let (train_id, _ids) = seed_train(&train_api, &wagon_api, 3);

    let first = wagon_api.normalize(train_id).expect("归一化应该成功");
    assert_eq!(first, 0, "创建路径已归一化, 无需写入");

    let second = wagon_api.normalize(train_id).expect("归一化应该成功");
    assert_eq!(second, 0, "重复归一化不产生新写入");
}

#[test]
fn test_normalize_empty_train_is_noop() {
    let (_tmp, train_api, wagon_api, _repo) = create_stack();
    let train = train_api
        .create_train(&test_helpers::train_draft("空列车"))
        .expect("创建应该成功");

    let rewrites = wagon_api.normalize(train.id).expect("归一化应该成功");
    assert_eq!(rewrites, 0);
}
