#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin = 1,
    Bookkeeper = 2,
    Viewer = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Bookkeeper),
            3 => Some(Role::Viewer),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Admins and bookkeepers may record money movements.
    pub fn can_write(self) -> bool {
        matches!(self, Role::Admin | Role::Bookkeeper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for role in [Role::Admin, Role::Bookkeeper, Role::Viewer] {
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(9), None);
    }

    #[test]
    fn viewers_are_read_only() {
        assert!(Role::Admin.can_write());
        assert!(Role::Bookkeeper.can_write());
        assert!(!Role::Viewer.can_write());
    }
}
