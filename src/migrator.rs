use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_catalog_tables::Migration),
            Box::new(m20240301_000002_create_fleet_tables::Migration),
            Box::new(m20240301_000003_create_item_tables::Migration),
            Box::new(m20240301_000004_create_work_order_tables::Migration),
            Box::new(m20240301_000005_create_purchase_tables::Migration),
            Box::new(m20240301_000006_create_movement_tables::Migration),
            Box::new(m20240301_000007_create_exchange_rates_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_catalog_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // The factor column is declared decimal(30,12) per spec. SQLite's
            // sea-query builder rejects precision > 16 (precision is ignored by
            // SQLite's NUMERIC affinity anyway, and the 30/12 bound is enforced
            // in Rust), so cap the declared precision there while keeping the
            // spec-mandated precision on Postgres.
            let factor_precision: u32 = match manager.get_database_backend() {
                sea_orm_migration::sea_orm::DatabaseBackend::Sqlite => 16,
                _ => 30,
            };
            manager
                .create_table(
                    Table::create()
                        .table(Dimensions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Dimensions::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Dimensions::Code).string().not_null())
                        .col(ColumnDef::new(Dimensions::Name).string().not_null())
                        .col(
                            ColumnDef::new(Dimensions::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("idx_dimensions_code")
                        .table(Dimensions::Table)
                        .col(Dimensions::Code)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(UnitsOfMeasure::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(UnitsOfMeasure::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(UnitsOfMeasure::DimensionId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(UnitsOfMeasure::Name).string().not_null())
                        .col(ColumnDef::new(UnitsOfMeasure::Symbol).string().null())
                        .col(
                            ColumnDef::new(UnitsOfMeasure::IsBase)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(UnitsOfMeasure::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("idx_units_of_measure_dimension_name")
                        .table(UnitsOfMeasure::Table)
                        .col(UnitsOfMeasure::DimensionId)
                        .col(UnitsOfMeasure::Name)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(UnitRelations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(UnitRelations::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(UnitRelations::DimensionId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UnitRelations::BaseUnitId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UnitRelations::RelatedUnitId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UnitRelations::Factor)
                                .decimal_len(factor_precision, 12)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UnitRelations::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("idx_unit_relations_base_related")
                        .table(UnitRelations::Table)
                        .col(UnitRelations::BaseUnitId)
                        .col(UnitRelations::RelatedUnitId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(UnitRelations::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(UnitsOfMeasure::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Dimensions::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Dimensions {
        Table,
        Id,
        Code,
        Name,
        Active,
    }

    #[derive(Iden)]
    enum UnitsOfMeasure {
        Table,
        Id,
        DimensionId,
        Name,
        Symbol,
        IsBase,
        Active,
    }

    #[derive(Iden)]
    enum UnitRelations {
        Table,
        Id,
        DimensionId,
        BaseUnitId,
        RelatedUnitId,
        Factor,
        Active,
    }
}

mod m20240301_000002_create_fleet_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_fleet_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Machines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Machines::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Machines::Code).string().not_null())
                        .col(ColumnDef::new(Machines::Name).string().not_null())
                        .col(ColumnDef::new(Machines::Description).string().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("idx_machines_code")
                        .table(Machines::Table)
                        .col(Machines::Code)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Warehouses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Warehouses::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Warehouses::Name).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("idx_warehouses_name")
                        .table(Warehouses::Table)
                        .col(Warehouses::Name)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Workers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Workers::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Workers::Code).string().not_null())
                        .col(ColumnDef::new(Workers::FirstName).string().not_null())
                        .col(ColumnDef::new(Workers::LastName).string().not_null())
                        .col(ColumnDef::new(Workers::DocumentId).string().not_null())
                        .col(ColumnDef::new(Workers::Position).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("idx_workers_code")
                        .table(Workers::Table)
                        .col(Workers::Code)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("idx_workers_document_id")
                        .table(Workers::Table)
                        .col(Workers::DocumentId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Suppliers::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Suppliers::Name).string().not_null())
                        .col(ColumnDef::new(Suppliers::TaxId).string().not_null())
                        .col(ColumnDef::new(Suppliers::Address).string().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("idx_suppliers_tax_id")
                        .table(Suppliers::Table)
                        .col(Suppliers::TaxId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Workers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Warehouses::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Machines::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Machines {
        Table,
        Id,
        Code,
        Name,
        Description,
    }

    #[derive(Iden)]
    enum Warehouses {
        Table,
        Id,
        Name,
    }

    #[derive(Iden)]
    enum Workers {
        Table,
        Id,
        Code,
        FirstName,
        LastName,
        DocumentId,
        Position,
    }

    #[derive(Iden)]
    enum Suppliers {
        Table,
        Id,
        Name,
        TaxId,
        Address,
    }
}

mod m20240301_000003_create_item_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_item_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Items::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Items::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Items::Code).string().not_null())
                        .col(ColumnDef::new(Items::Name).string().not_null())
                        .col(ColumnDef::new(Items::ItemType).string().not_null())
                        .col(ColumnDef::new(Items::DimensionId).integer().null())
                        .col(ColumnDef::new(Items::UnitId).integer().null())
                        .col(
                            ColumnDef::new(Items::Stock)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Items::LastSerial)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Items::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Items::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("idx_items_code")
                        .table(Items::Table)
                        .col(Items::Code)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ItemUnits::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ItemUnits::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ItemUnits::ItemId).integer().not_null())
                        .col(ColumnDef::new(ItemUnits::PurchaseLineId).integer().null())
                        .col(ColumnDef::new(ItemUnits::Serial).string().not_null())
                        .col(ColumnDef::new(ItemUnits::State).string().not_null())
                        .col(
                            ColumnDef::new(ItemUnits::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("idx_item_units_serial")
                        .table(ItemUnits::Table)
                        .col(ItemUnits::Serial)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_item_units_item_id")
                        .table(ItemUnits::Table)
                        .col(ItemUnits::ItemId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ItemUnits::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Items::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Items {
        Table,
        Id,
        Code,
        Name,
        ItemType,
        DimensionId,
        UnitId,
        Stock,
        LastSerial,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum ItemUnits {
        Table,
        Id,
        ItemId,
        PurchaseLineId,
        Serial,
        State,
        CreatedAt,
    }
}

mod m20240301_000004_create_work_order_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_work_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(WorkOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WorkOrders::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(WorkOrders::Code).string().not_null())
                        .col(ColumnDef::new(WorkOrders::MachineId).integer().not_null())
                        .col(ColumnDef::new(WorkOrders::ScheduledDate).date().not_null())
                        .col(ColumnDef::new(WorkOrders::Priority).string().not_null())
                        .col(ColumnDef::new(WorkOrders::Status).string().not_null())
                        .col(ColumnDef::new(WorkOrders::StartedTime).time().null())
                        .col(ColumnDef::new(WorkOrders::EndedTime).time().null())
                        .col(
                            ColumnDef::new(WorkOrders::HourMeter)
                                .decimal_len(10, 2)
                                .null(),
                        )
                        .col(ColumnDef::new(WorkOrders::EquipmentState).string().null())
                        .col(ColumnDef::new(WorkOrders::Notes).string().null())
                        .col(
                            ColumnDef::new(WorkOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("idx_work_orders_code")
                        .table(WorkOrders::Table)
                        .col(WorkOrders::Code)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_work_orders_machine_id")
                        .table(WorkOrders::Table)
                        .col(WorkOrders::MachineId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Activities::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Activities::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Activities::WorkOrderId).integer().not_null())
                        .col(ColumnDef::new(Activities::ActivityType).string().not_null())
                        .col(ColumnDef::new(Activities::MaintenanceType).string().null())
                        .col(ColumnDef::new(Activities::Subtype).string().null())
                        .col(ColumnDef::new(Activities::Description).string().null())
                        .col(
                            ColumnDef::new(Activities::IsPlanned)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Activities::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_activities_work_order_id")
                        .table(Activities::Table)
                        .col(Activities::WorkOrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Activities::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(WorkOrders::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum WorkOrders {
        Table,
        Id,
        Code,
        MachineId,
        ScheduledDate,
        Priority,
        Status,
        StartedTime,
        EndedTime,
        HourMeter,
        EquipmentState,
        Notes,
        CreatedAt,
    }

    #[derive(Iden)]
    enum Activities {
        Table,
        Id,
        WorkOrderId,
        ActivityType,
        MaintenanceType,
        Subtype,
        Description,
        IsPlanned,
        CreatedAt,
    }
}

mod m20240301_000005_create_purchase_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_purchase_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Purchases::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Purchases::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Purchases::VoucherType).string().not_null())
                        .col(ColumnDef::new(Purchases::VoucherNumber).string().not_null())
                        .col(ColumnDef::new(Purchases::SupplierId).integer().null())
                        .col(ColumnDef::new(Purchases::Currency).string().not_null())
                        .col(ColumnDef::new(Purchases::PurchaseDate).date().not_null())
                        .col(
                            ColumnDef::new(Purchases::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("idx_purchases_voucher")
                        .table(Purchases::Table)
                        .col(Purchases::VoucherType)
                        .col(Purchases::VoucherNumber)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseLines::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(PurchaseLines::PurchaseId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseLines::ItemId).integer().not_null())
                        .col(
                            ColumnDef::new(PurchaseLines::Quantity)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseLines::UnitId).integer().not_null())
                        .col(ColumnDef::new(PurchaseLines::Currency).string().not_null())
                        .col(
                            ColumnDef::new(PurchaseLines::UnitValue)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("idx_purchase_lines_purchase_item")
                        .table(PurchaseLines::Table)
                        .col(PurchaseLines::PurchaseId)
                        .col(PurchaseLines::ItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_lines_item_id")
                        .table(PurchaseLines::Table)
                        .col(PurchaseLines::ItemId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PurchaseLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Purchases::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Purchases {
        Table,
        Id,
        VoucherType,
        VoucherNumber,
        SupplierId,
        Currency,
        PurchaseDate,
        CreatedAt,
    }

    #[derive(Iden)]
    enum PurchaseLines {
        Table,
        Id,
        PurchaseId,
        ItemId,
        Quantity,
        UnitId,
        Currency,
        UnitValue,
    }
}

mod m20240301_000006_create_movement_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000006_create_movement_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PartMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PartMovements::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(PartMovements::ActivityId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PartMovements::ItemUnitId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PartMovements::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_part_movements_activity_id")
                        .table(PartMovements::Table)
                        .col(PartMovements::ActivityId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_part_movements_item_unit_id")
                        .table(PartMovements::Table)
                        .col(PartMovements::ItemUnitId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ConsumableMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ConsumableMovements::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ConsumableMovements::ActivityId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ConsumableMovements::ItemId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ConsumableMovements::Quantity)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(ConsumableMovements::UnitId).integer().null())
                        .col(
                            ColumnDef::new(ConsumableMovements::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_consumable_movements_item_id")
                        .table(ConsumableMovements::Table)
                        .col(ConsumableMovements::ItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(LocationHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(LocationHistory::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(LocationHistory::ItemUnitId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(LocationHistory::MachineId).integer().null())
                        .col(
                            ColumnDef::new(LocationHistory::WarehouseId)
                                .integer()
                                .null(),
                        )
                        .col(ColumnDef::new(LocationHistory::WorkerId).integer().null())
                        .col(
                            ColumnDef::new(LocationHistory::WorkOrderId)
                                .integer()
                                .null(),
                        )
                        .col(ColumnDef::new(LocationHistory::State).string().not_null())
                        .col(
                            ColumnDef::new(LocationHistory::StartedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(LocationHistory::EndedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_location_history_unit_open")
                        .table(LocationHistory::Table)
                        .col(LocationHistory::ItemUnitId)
                        .col(LocationHistory::EndedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_location_history_machine_id")
                        .table(LocationHistory::Table)
                        .col(LocationHistory::MachineId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(LocationHistory::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ConsumableMovements::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PartMovements::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum PartMovements {
        Table,
        Id,
        ActivityId,
        ItemUnitId,
        CreatedAt,
    }

    #[derive(Iden)]
    enum ConsumableMovements {
        Table,
        Id,
        ActivityId,
        ItemId,
        Quantity,
        UnitId,
        CreatedAt,
    }

    #[derive(Iden)]
    enum LocationHistory {
        Table,
        Id,
        ItemUnitId,
        MachineId,
        WarehouseId,
        WorkerId,
        WorkOrderId,
        State,
        StartedAt,
        EndedAt,
    }
}

mod m20240301_000007_create_exchange_rates_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000007_create_exchange_rates_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ExchangeRates::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ExchangeRates::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ExchangeRates::Currency).string().not_null())
                        .col(ColumnDef::new(ExchangeRates::RateDate).date().not_null())
                        .col(
                            ColumnDef::new(ExchangeRates::Rate)
                                .decimal_len(12, 6)
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("idx_exchange_rates_currency_date")
                        .table(ExchangeRates::Table)
                        .col(ExchangeRates::Currency)
                        .col(ExchangeRates::RateDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ExchangeRates::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum ExchangeRates {
        Table,
        Id,
        Currency,
        RateDate,
        Rate,
    }
}
