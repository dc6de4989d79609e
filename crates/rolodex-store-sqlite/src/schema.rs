//! SQL schema for the Rolodex SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
///
/// Audit user columns are plain integers rather than foreign keys so that
/// history survives the deletion of the user who wrote it.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    is_superuser  INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS groups (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS group_members (
    group_id INTEGER NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
    user_id  INTEGER NOT NULL REFERENCES users(id)  ON DELETE CASCADE,
    PRIMARY KEY (group_id, user_id)
);

CREATE TABLE IF NOT EXISTS user_profiles (
    id      INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE
);

-- permission: 'read_contact' | 'write_contact'
CREATE TABLE IF NOT EXISTS profile_user_shares (
    profile_id INTEGER NOT NULL REFERENCES user_profiles(id) ON DELETE CASCADE,
    user_id    INTEGER NOT NULL REFERENCES users(id)         ON DELETE CASCADE,
    permission TEXT NOT NULL,
    PRIMARY KEY (profile_id, user_id, permission)
);

CREATE TABLE IF NOT EXISTS profile_group_shares (
    profile_id INTEGER NOT NULL REFERENCES user_profiles(id) ON DELETE CASCADE,
    group_id   INTEGER NOT NULL REFERENCES groups(id)        ON DELETE CASCADE,
    permission TEXT NOT NULL,
    PRIMARY KEY (profile_id, group_id, permission)
);

CREATE TABLE IF NOT EXISTS reference_types (
    id            INTEGER PRIMARY KEY,
    kind          TEXT NOT NULL,   -- TypeKind discriminant
    name          TEXT NOT NULL,
    description   TEXT,
    creation_time TEXT NOT NULL,
    update_time   TEXT NOT NULL,
    UNIQUE (kind, name)
);

CREATE TABLE IF NOT EXISTS value_entities (
    id             INTEGER PRIMARY KEY,
    kind           TEXT NOT NULL,   -- ValueKind discriminant
    value_json     TEXT NOT NULL,   -- JSON payload (inner data only)
    uuid           TEXT NOT NULL UNIQUE,
    version        INTEGER NOT NULL,
    site           TEXT NOT NULL,
    creation_user  INTEGER NOT NULL,
    effective_user INTEGER NOT NULL,
    update_user    INTEGER NOT NULL,
    creation_time  TEXT NOT NULL,
    update_time    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS contacts (
    id                INTEGER PRIMARY KEY,
    name_id           INTEGER REFERENCES value_entities(id)  ON DELETE SET NULL,
    formatted_name_id INTEGER REFERENCES value_entities(id)  ON DELETE SET NULL,
    contact_type_id   INTEGER REFERENCES reference_types(id) ON DELETE SET NULL,
    gender_id         INTEGER REFERENCES reference_types(id) ON DELETE SET NULL,
    birth_date        TEXT,            -- YYYY-MM-DD
    anniversary       TEXT,            -- YYYY-MM-DD
    priority          INTEGER NOT NULL DEFAULT 0,
    uuid              TEXT NOT NULL UNIQUE,
    version           INTEGER NOT NULL,
    site              TEXT NOT NULL,
    creation_user     INTEGER NOT NULL,
    effective_user    INTEGER NOT NULL,
    update_user       INTEGER NOT NULL,
    creation_time     TEXT NOT NULL,
    update_time       TEXT NOT NULL
);

-- One table for every association kind; `kind` is the AssociationKind
-- discriminant.
CREATE TABLE IF NOT EXISTS contact_associations (
    id              INTEGER PRIMARY KEY,
    kind            TEXT NOT NULL,
    contact_id      INTEGER NOT NULL REFERENCES contacts(id)        ON DELETE CASCADE,
    value_id        INTEGER NOT NULL REFERENCES value_entities(id)  ON DELETE CASCADE,
    type_id         INTEGER          REFERENCES reference_types(id) ON DELETE SET NULL,
    organization_id INTEGER          REFERENCES value_entities(id)  ON DELETE SET NULL,
    priority        INTEGER NOT NULL DEFAULT 0,
    uuid            TEXT NOT NULL UNIQUE,
    version         INTEGER NOT NULL,
    site            TEXT NOT NULL,
    creation_user   INTEGER NOT NULL,
    effective_user  INTEGER NOT NULL,
    update_user     INTEGER NOT NULL,
    creation_time   TEXT NOT NULL,
    update_time     TEXT NOT NULL
);

-- A NULL type still takes part in uniqueness.
CREATE UNIQUE INDEX IF NOT EXISTS contact_associations_unique
    ON contact_associations(kind, contact_id, value_id, IFNULL(type_id, -1));
CREATE INDEX IF NOT EXISTS contact_associations_contact_idx
    ON contact_associations(contact_id, kind);
CREATE INDEX IF NOT EXISTS contact_associations_value_idx
    ON contact_associations(value_id);

CREATE TABLE IF NOT EXISTS related_contacts (
    id                   INTEGER PRIMARY KEY,
    from_contact_id      INTEGER NOT NULL REFERENCES contacts(id)        ON DELETE CASCADE,
    to_contact_id        INTEGER NOT NULL REFERENCES contacts(id)        ON DELETE CASCADE,
    relationship_type_id INTEGER          REFERENCES reference_types(id) ON DELETE SET NULL,
    priority             INTEGER NOT NULL DEFAULT 0,
    uuid                 TEXT NOT NULL UNIQUE,
    version              INTEGER NOT NULL,
    site                 TEXT NOT NULL,
    creation_user        INTEGER NOT NULL,
    effective_user       INTEGER NOT NULL,
    update_user          INTEGER NOT NULL,
    creation_time        TEXT NOT NULL,
    update_time          TEXT NOT NULL,
    CHECK (from_contact_id != to_contact_id)
);

CREATE UNIQUE INDEX IF NOT EXISTS related_contacts_unique
    ON related_contacts(from_contact_id, to_contact_id, IFNULL(relationship_type_id, -1));

CREATE TABLE IF NOT EXISTS contact_user_permissions (
    contact_id INTEGER NOT NULL REFERENCES contacts(id) ON DELETE CASCADE,
    user_id    INTEGER NOT NULL REFERENCES users(id)    ON DELETE CASCADE,
    permission TEXT NOT NULL,
    PRIMARY KEY (contact_id, user_id, permission)
);

CREATE TABLE IF NOT EXISTS contact_group_permissions (
    contact_id INTEGER NOT NULL REFERENCES contacts(id) ON DELETE CASCADE,
    group_id   INTEGER NOT NULL REFERENCES groups(id)   ON DELETE CASCADE,
    permission TEXT NOT NULL,
    PRIMARY KEY (contact_id, group_id, permission)
);

PRAGMA user_version = 1;
";
