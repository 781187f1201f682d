//! Campaign log database schema.

/// SQL to create the campaign turns table. Mirrors
/// `migrations/0001_campaign_turns.sql`.
pub const CREATE_CAMPAIGN_TURNS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS campaign_turns (
    campaign_id  UUID NOT NULL,
    turn_number  BIGINT NOT NULL CHECK (turn_number > 0),
    actors       TEXT[] NOT NULL,
    record       JSONB NOT NULL,
    state_digest VARCHAR(64) NOT NULL,
    committed_at TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (campaign_id, turn_number)
);

CREATE INDEX IF NOT EXISTS idx_campaign_turns_actors
    ON campaign_turns USING GIN (actors);
";
